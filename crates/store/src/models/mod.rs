mod link;
mod page;
mod title;

pub use self::link::LinkDetails;
pub use self::page::{PageEntry, SitePage};
pub use self::title::TitleEntry;
