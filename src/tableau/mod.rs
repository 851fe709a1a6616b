//! Tableau REST API resources
//!
//! Paged listings of projects and data sources, lazy pagination over
//! their listings, and packaged extract downloads.

pub mod datasources;
pub mod pagination;
pub mod projects;

pub use datasources::{DataSource, DataSourceListing, ProjectRef, download_datasource};
pub use pagination::{Named, Page, PageRequest, PageSource, Pager, find_by_name, find_first};
pub use projects::{Project, ProjectListing};
