use std::path::{Path, PathBuf};

// Fixed-string layout contract; downstream result writers key off these
// names, so they must not drift.
pub const ITERATION_DIR_PREFIX: &str = "iteration_";
pub const FINAL_DIR_NAME: &str = "iteration_final";
pub const INTERMEDIATE_SUBDIR: &str = "tmp";

/// Root of the per-iteration subtree under the run's output base.
pub fn intermediate_base(output_base: &Path) -> PathBuf {
    output_base.join(INTERMEDIATE_SUBDIR)
}

/// Where round `iteration` writes its output.
pub fn current_path(output_base: &Path, iteration: u32) -> PathBuf {
    intermediate_base(output_base).join(format!("{ITERATION_DIR_PREFIX}{iteration}"))
}

/// Where round `iteration` reads the prior round's output.
///
/// For iteration 0 this is `iteration_-1`, which never exists: rounds treat
/// the missing directory as "no prior state".
pub fn previous_path(output_base: &Path, iteration: u32) -> PathBuf {
    let previous = i64::from(iteration) - 1;
    intermediate_base(output_base).join(format!("{ITERATION_DIR_PREFIX}{previous}"))
}

/// Stable, externally visible location the final round's output is promoted
/// to.
pub fn final_path(output_base: &Path) -> PathBuf {
    output_base.join(FINAL_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn previous_of_n_is_current_of_n_minus_one() {
        let base = Path::new("/runs/model");
        for n in 1..=5u32 {
            assert_eq!(previous_path(base, n), current_path(base, n - 1));
        }
    }

    #[test]
    fn iteration_zero_previous_collides_with_no_round_output() {
        let base = Path::new("/runs/model");
        let cold = previous_path(base, 0);
        assert!(cold.ends_with("iteration_-1"));
        for n in 0..100u32 {
            assert_ne!(cold, current_path(base, n));
        }
    }

    #[test]
    fn layout_strings_are_stable() {
        let base = Path::new("/runs/model");
        assert_eq!(
            current_path(base, 3),
            PathBuf::from("/runs/model/tmp/iteration_3")
        );
        assert_eq!(final_path(base), PathBuf::from("/runs/model/iteration_final"));
    }
}
