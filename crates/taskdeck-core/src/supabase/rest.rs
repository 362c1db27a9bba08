//! PostgREST task table operations.

use super::{SupabaseClient, check_status};
use crate::backend::BackendResult;
use crate::error::BackendError;
use crate::model::{NewTask, Task, TaskId, TaskPatch};

impl SupabaseClient {
    fn table_request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.rest_url())
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.bearer()))
    }

    /// `select * where email = owner order by id asc`.
    pub(super) async fn select_tasks(&self, owner: &str) -> BackendResult<Vec<Task>> {
        let resp = self
            .table_request(reqwest::Method::GET)
            .query(&[
                ("select", "*".to_string()),
                ("email", format!("eq.{owner}")),
                ("order", "id.asc".to_string()),
            ])
            .send()
            .await?;
        let body = check_status(resp).await?.text().await?;

        serde_json::from_str(&body).map_err(|e| BackendError::Decode(format!("tasks: {e}")))
    }

    pub(super) async fn insert_rows(&self, task: &NewTask) -> BackendResult<()> {
        let resp = self
            .table_request(reqwest::Method::POST)
            .header("Prefer", "return=minimal")
            .json(&[task])
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    pub(super) async fn patch_row(&self, id: &TaskId, patch: &TaskPatch) -> BackendResult<()> {
        let resp = self
            .table_request(reqwest::Method::PATCH)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=minimal")
            .json(patch)
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    pub(super) async fn delete_row(&self, id: &TaskId) -> BackendResult<()> {
        let resp = self
            .table_request(reqwest::Method::DELETE)
            .query(&[("id", format!("eq.{id}"))])
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }
}
