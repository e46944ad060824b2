//! Company list and company-detail state.
//!
//! DESIGN
//! ======
//! The detail view (`selected`) carries branches, employees, services and
//! subdomains as returned by `GET /company/{id}`; list entries usually do not.
//! Updates and deletes keep the two views consistent by id.

#[cfg(test)]
#[path = "companies_test.rs"]
mod companies_test;

use super::store::{ActionResult, Collection};
use crate::net::api::{ApiClient, path_segment};
use crate::net::transport::Method;
use crate::net::types::{Company, CompanyInput};

const COMPANY_LIST_PATH: &str = "/admin/companies";
const COMPANY_PATH: &str = "/company";

fn company_path(id: &str) -> String {
    format!("{COMPANY_PATH}/{}", path_segment(id))
}

#[derive(Clone)]
pub struct CompanyStore {
    api: ApiClient,
    pub companies: Collection<Company>,
}

impl CompanyStore {
    pub fn new(api: ApiClient) -> Self {
        Self { api, companies: Collection::new() }
    }

    pub async fn fetch_companies(&self) {
        self.companies.fetch_list(&self.api, COMPANY_LIST_PATH).await;
    }

    pub async fn fetch_company_by_id(&self, id: &str) {
        self.companies.fetch_one(&self.api, &company_path(id)).await;
    }

    pub async fn create_company(&self, input: &CompanyInput) -> ActionResult<Company> {
        self.companies.create(&self.api, COMPANY_PATH, input).await
    }

    pub async fn update_company(&self, id: &str, input: &CompanyInput) -> ActionResult {
        self.companies
            .update(&self.api, Method::Put, &company_path(id), id, input)
            .await
            .discard()
    }

    pub async fn delete_company(&self, id: &str) -> ActionResult {
        self.companies.remove(&self.api, &company_path(id), id).await
    }
}
