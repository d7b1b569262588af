//! Locators, ranges, multipart bookkeeping, and the crate error type.

mod byte_range;
mod error;
mod object_locator;
mod part_record;
mod upload_session;

pub use byte_range::ByteRange;
pub use error::{BoxedError, Error, PutError, Result};
pub use object_locator::ObjectLocator;
pub use part_record::PartRecord;
pub use upload_session::UploadSession;
