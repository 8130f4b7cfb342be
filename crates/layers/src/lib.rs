pub mod request;
pub mod source;
pub mod symbology;
pub mod urls;

pub use request::*;
pub use source::*;
pub use symbology::*;
pub use urls::*;
