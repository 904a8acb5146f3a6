pub mod assemble;
pub mod emitter;
pub mod error;
pub mod platform;
pub mod session;

pub use assemble::assemble;
pub use emitter::{StreamEmitter, StreamEvent};
pub use error::SessionError;
pub use platform::{
    CommentStream, ExtractOptions, PlatformExtractor, PlatformPage, PlatformRegistry,
    RenderedPageExtractor,
};
pub use session::{ScrapeService, StreamHandle};
