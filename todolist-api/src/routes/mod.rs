/// API route handlers
///
/// - `health`: Health check endpoint
/// - `auth`: Registration and login
/// - `resources`: Generic CRUD handlers for lists, tasks and subtasks

use serde::Serialize;

pub mod auth;
pub mod health;
pub mod resources;

/// Success envelope: `{ "success": true, "data": ... }`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Success envelope for collections, with the resolved page window
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub page_number: u32,
    pub items_per_page: u32,
}
