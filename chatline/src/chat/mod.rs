mod clock;
mod listener;
mod render;
mod state;
mod thread;

pub use clock::{INVALID_TIME, WallClock, format_clock};
pub use listener::ChatListener;
pub use render::{
    DECRYPTION_ERROR, DEFAULT_DOCUMENT_NAME, DEFAULT_PROFILE_PIC, DisplayMessage, MessageBody,
    MessageRenderer, PHOTO_PREVIEW, RenderOptions, decrypt_text, is_sent_by,
};
pub use state::{ImagePreview, MenuState, Overflow};
pub use thread::ChatThread;

use listener::StubListener;
