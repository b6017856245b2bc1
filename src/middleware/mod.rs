pub mod init_guard;
pub mod note_input;
