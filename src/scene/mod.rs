//! Scene graph model and construction.
//!
//! A page's drawing operators become a [`SceneGraph`]: a tree of groups
//! (one per form XObject invocation) holding path, image, and text items in
//! display space, annotated with tags by the later pipeline stages.

pub mod builder;
pub mod group;

pub use builder::{is_painting, SceneBuilder};
pub use group::{
    tags, GroupId, ImageItem, PathItem, SceneGraph, SceneGroup, SceneItem, TagValue,
};
