pub mod applications;
pub mod mailbox;
