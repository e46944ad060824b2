//! Admin-user list state.

#[cfg(test)]
#[path = "admins_test.rs"]
mod admins_test;

use super::store::{ActionResult, Collection};
use crate::net::api::{ApiClient, path_segment};
use crate::net::transport::Method;
use crate::net::types::{Admin, AdminInput};

const ADMINS_PATH: &str = "/admin";

fn admin_path(id: &str) -> String {
    format!("{ADMINS_PATH}/{}", path_segment(id))
}

#[derive(Clone)]
pub struct AdminStore {
    api: ApiClient,
    pub admins: Collection<Admin>,
}

impl AdminStore {
    pub fn new(api: ApiClient) -> Self {
        Self { api, admins: Collection::new() }
    }

    pub async fn fetch_admins(&self) {
        self.admins.fetch_list(&self.api, ADMINS_PATH).await;
    }

    pub async fn create_admin(&self, input: &AdminInput) -> ActionResult<Admin> {
        self.admins.create(&self.api, ADMINS_PATH, input).await
    }

    pub async fn update_admin(&self, id: &str, input: &AdminInput) -> ActionResult {
        self.admins
            .update(&self.api, Method::Patch, &admin_path(id), id, input)
            .await
            .discard()
    }

    pub async fn delete_admin(&self, id: &str) -> ActionResult {
        self.admins.remove(&self.api, &admin_path(id), id).await
    }
}
