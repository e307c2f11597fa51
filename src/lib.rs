//! RedditArchiver core — orchestration for asynchronous Reddit thread
//! archiving.
//!
//! This crate owns job creation and the detached worker lifecycle, the OAuth2
//! credential flow for browser sessions, remaining-time estimation from
//! historical throughput, status reporting for the polling caller and the
//! periodic maintenance tasks. HTTP routing, the persistent store's queries
//! and the archiver that actually walks Reddit threads are external
//! collaborators reached through the traits defined here.

#![allow(missing_docs)]

pub mod app;
pub mod auth;
pub mod config;
pub mod jobs;
pub mod setup_tracing;
pub mod store;
pub mod submission;
pub mod token;
