//! Subject (identity store) repository module.

mod r#trait;
pub use r#trait::SubjectRepository;

mod mock;
pub use mock::MockSubjectRepository;
