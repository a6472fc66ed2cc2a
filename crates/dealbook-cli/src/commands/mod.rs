//! Command handlers

use dealbook_core::Backend;

pub mod config;
pub mod deal;
pub mod project;
pub mod status;
pub mod task;
pub mod token;
pub mod vendor;

/// Caveat to show for a backend whose records do not outlive the process
pub fn backend_note(backend: Backend) -> Option<&'static str> {
    match backend {
        Backend::Memory => Some(
            "The memory backend keeps records only while one command runs; nothing is saved between commands.",
        ),
        Backend::File => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_note_only_for_memory() {
        assert!(backend_note(Backend::Memory).is_some());
        assert!(backend_note(Backend::File).is_none());
    }
}
