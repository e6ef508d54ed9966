//! Init command presentation.

use crate::config::InitResult;

pub fn format_init_result(result: &InitResult, force: bool) -> String {
    match (result.created, force) {
        (true, true) => format!("  ✓ {} (overwritten)", result.path.display()),
        (true, false) => format!("  ✓ {}", result.path.display()),
        (false, _) => format!(
            "  ⊘ {} (already exists, skipped; use --force to overwrite)",
            result.path.display()
        ),
    }
}
