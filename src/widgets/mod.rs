pub mod add_client;
pub mod ai_prompt;
pub mod prompt_list;
pub mod public_chat;
pub mod roster;
pub mod roster_viewer;
pub mod session_chat;
