//! Client list, client detail and appointment history state.

#[cfg(test)]
#[path = "clients_test.rs"]
mod clients_test;

use super::observable::Observable;
use super::store::{ActionResult, Collection};
use crate::net::api::{ApiClient, path_segment};
use crate::net::types::{Client, ClientAppointment};

const CLIENT_LIST_PATH: &str = "/admin/clients";

fn client_path(id: &str) -> String {
    format!("/client/{}", path_segment(id))
}

fn client_appointments_path(id: &str) -> String {
    format!("/client/{}/appointments", path_segment(id))
}

#[derive(Clone)]
pub struct ClientStore {
    api: ApiClient,
    pub clients: Collection<Client>,
    pub appointments: Observable<Vec<ClientAppointment>>,
}

impl ClientStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            clients: Collection::new(),
            appointments: Observable::new(Vec::new()),
        }
    }

    pub async fn fetch_clients(&self) {
        self.clients.fetch_list(&self.api, CLIENT_LIST_PATH).await;
    }

    pub async fn fetch_client_by_id(&self, id: &str) {
        self.clients.fetch_one(&self.api, &client_path(id)).await;
    }

    pub async fn fetch_client_appointments(&self, client_id: &str) {
        self.clients
            .fetch_into(&self.api, &client_appointments_path(client_id), &self.appointments)
            .await;
    }

    pub async fn delete_client(&self, id: &str) -> ActionResult {
        self.clients.remove(&self.api, &client_path(id), id).await
    }
}
