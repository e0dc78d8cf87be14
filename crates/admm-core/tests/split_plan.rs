use admm_core::types::{BlockLocation, InputFile, Split, SplitPlan, SplitPlanError};

fn file(path: &str, len: u64) -> InputFile {
    InputFile {
        path: path.to_string(),
        len,
        blocks: vec![BlockLocation {
            offset: 0,
            len,
            hosts: vec!["host-a".to_string()],
        }],
    }
}

fn split(path: &str, offset: u64, len: u64) -> Split {
    Split {
        path: path.to_string(),
        offset,
        len,
        hosts: Vec::new(),
    }
}

#[test]
fn split_range_is_half_open() {
    let s = split("a", 10, 20);
    assert_eq!(s.end(), 30);
    assert!(!s.is_empty());
}

#[test]
fn contiguous_plan_validates() {
    let files = vec![file("a", 100), file("b", 50)];
    let plan = SplitPlan {
        splits: vec![split("a", 0, 60), split("a", 60, 40), split("b", 0, 50)],
    };
    assert_eq!(plan.validate(&files), Ok(()));
}

#[test]
fn gap_is_rejected() {
    let files = vec![file("a", 100)];
    let plan = SplitPlan {
        splits: vec![split("a", 0, 40), split("a", 50, 50)],
    };
    assert_eq!(
        plan.validate(&files),
        Err(SplitPlanError::NotContiguous {
            path: "a".to_string(),
            expected: 40,
            found: 50,
        })
    );
}

#[test]
fn overlap_is_rejected() {
    let files = vec![file("a", 100)];
    let plan = SplitPlan {
        splits: vec![split("a", 0, 60), split("a", 40, 60)],
    };
    assert!(matches!(
        plan.validate(&files),
        Err(SplitPlanError::NotContiguous { .. })
    ));
}

#[test]
fn short_coverage_is_rejected() {
    let files = vec![file("a", 100)];
    let plan = SplitPlan {
        splits: vec![split("a", 0, 60)],
    };
    assert_eq!(
        plan.validate(&files),
        Err(SplitPlanError::LengthMismatch {
            path: "a".to_string(),
            covered: 60,
            len: 100,
        })
    );
}

#[test]
fn unknown_file_is_rejected() {
    let files = vec![file("a", 100)];
    let plan = SplitPlan {
        splits: vec![split("a", 0, 100), split("ghost", 0, 10)],
    };
    assert_eq!(
        plan.validate(&files),
        Err(SplitPlanError::UnknownFile {
            path: "ghost".to_string(),
        })
    );
}

#[test]
fn uncovered_file_is_rejected() {
    let files = vec![file("a", 100), file("b", 10)];
    let plan = SplitPlan {
        splits: vec![split("a", 0, 100)],
    };
    assert_eq!(
        plan.validate(&files),
        Err(SplitPlanError::Uncovered {
            path: "b".to_string(),
        })
    );
}

#[test]
fn degenerate_split_only_for_empty_file() {
    let files = vec![file("empty", 0)];
    let plan = SplitPlan {
        splits: vec![split("empty", 0, 0)],
    };
    assert_eq!(plan.validate(&files), Ok(()));

    let files = vec![file("a", 10)];
    let plan = SplitPlan {
        splits: vec![split("a", 0, 0), split("a", 0, 10)],
    };
    assert_eq!(
        plan.validate(&files),
        Err(SplitPlanError::EmptySplit {
            path: "a".to_string(),
        })
    );
}

#[test]
fn degenerate_split_must_not_carry_hosts() {
    let files = vec![file("empty", 0)];
    let plan = SplitPlan {
        splits: vec![Split {
            path: "empty".to_string(),
            offset: 0,
            len: 0,
            hosts: vec!["host-a".to_string()],
        }],
    };
    assert_eq!(
        plan.validate(&files),
        Err(SplitPlanError::DegenerateSplitWithHosts {
            path: "empty".to_string(),
        })
    );
}

#[test]
fn block_location_lookup_prefers_covering_block() {
    let f = InputFile {
        path: "a".to_string(),
        len: 200,
        blocks: vec![
            BlockLocation {
                offset: 0,
                len: 100,
                hosts: vec!["h1".to_string()],
            },
            BlockLocation {
                offset: 100,
                len: 100,
                hosts: vec!["h2".to_string()],
            },
        ],
    };
    assert_eq!(f.hosts_at(0), vec!["h1".to_string()]);
    assert_eq!(f.hosts_at(99), vec!["h1".to_string()]);
    assert_eq!(f.hosts_at(100), vec!["h2".to_string()]);
    assert_eq!(f.hosts_at(200), Vec::<String>::new());
    assert_eq!(f.last_block_hosts(), vec!["h2".to_string()]);
    assert_eq!(f.first_block_hosts(), vec!["h1".to_string()]);
}
