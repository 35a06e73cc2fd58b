pub mod articles;
pub mod blogs;
pub mod collections;
pub mod definitions;
pub mod drop;
pub mod files;
pub mod metafields;
pub mod metaobjects;
pub mod pages;
pub mod products;
