// Documentation uploads: one transient plain-text file per browser session.

pub mod handlers;
pub mod store;
