//! Small cross-cutting helpers with no other natural home.

pub mod ext_serde;
