//! Asynchronous VM API session.

use crate::models::{HostOperation, ListResponse};
use crate::Result;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use vmmanager_core::ids::{ConsulId, HostId, TaskId};
use vmmanager_core::query::{Filter, QueryParams};
use vmmanager_core::{ApiDefinition, ApiSession, AreaSession, RequestOptions, SessionConfig};

const HOST_PATH: &str = "/host";
const TASK_PATH: &str = "/task";

/// Session for the VM API (`/vm/v3`): hosts and the task manager.
#[derive(Debug)]
pub struct VmSession {
    inner: ApiSession,
}

impl AreaSession for VmSession {
    const DEFINITION: ApiDefinition = ApiDefinition::Vm;

    fn from_session(session: ApiSession) -> Self {
        Self { inner: session }
    }

    fn session(&self) -> &ApiSession {
        &self.inner
    }

    fn into_session(self) -> ApiSession {
        self.inner
    }
}

impl VmSession {
    /// Open a session against `config.base_url` at `/vm/v3`.
    pub fn new(config: &SessionConfig) -> Result<Self> {
        Self::open(config)
    }

    /// Create a virtual machine from `host_params`.
    ///
    /// The reply usually carries the new host id and a `task` correlation id
    /// for [`VmSession::get_task_by_consul_id`].
    pub async fn host_create<B>(&self, host_params: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        self.host_create_with(host_params, RequestOptions::new())
            .await
    }

    /// [`VmSession::host_create`] with extra request options. `host_params`
    /// replaces any JSON body already set on `options`.
    pub async fn host_create_with<B>(&self, host_params: &B, options: RequestOptions) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        self.inner.post(HOST_PATH, options.try_json(host_params)?).await
    }

    /// Delete a virtual machine.
    pub async fn host_delete(&self, host_id: impl Into<HostId>) -> Result<Value> {
        self.host_delete_with(host_id, RequestOptions::new()).await
    }

    /// [`VmSession::host_delete`] with extra request options.
    pub async fn host_delete_with(
        &self,
        host_id: impl Into<HostId>,
        options: RequestOptions,
    ) -> Result<Value> {
        let host_id = host_id.into();
        debug!(%host_id, "deleting VMmanager host");
        let path = format!("{HOST_PATH}/{host_id}");
        self.inner.delete(&path, options).await
    }

    /// Edit general settings of a virtual machine.
    pub async fn host_edit<B>(&self, host_id: impl Into<HostId>, host_params: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        self.host_edit_with(host_id, host_params, RequestOptions::new())
            .await
    }

    /// [`VmSession::host_edit`] with extra request options.
    pub async fn host_edit_with<B>(
        &self,
        host_id: impl Into<HostId>,
        host_params: &B,
        options: RequestOptions,
    ) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        let path = format!("{HOST_PATH}/{}", host_id.into());
        self.inner.post(&path, options.try_json(host_params)?).await
    }

    /// Read the host id and task correlation id out of a host operation reply.
    ///
    /// # Errors
    ///
    /// Returns [`vmmanager_core::Error::Decode`] naming the host endpoint if
    /// the reply has another shape.
    pub fn host_operation(&self, body: &Value) -> Result<HostOperation> {
        let url = self.inner.url_for(HOST_PATH, &QueryParams::new())?;
        HostOperation::from_body(url.as_str(), body)
    }

    /// Fetch a task of the task manager by its id.
    pub async fn get_task(&self, task_id: impl Into<TaskId>) -> Result<Value> {
        self.get_task_with(task_id, RequestOptions::new()).await
    }

    /// [`VmSession::get_task`] with extra request options.
    pub async fn get_task_with(
        &self,
        task_id: impl Into<TaskId>,
        options: RequestOptions,
    ) -> Result<Value> {
        let path = format!("{TASK_PATH}/{}", task_id.into());
        self.inner.get(&path, options).await
    }

    /// List tasks whose `consul_id` equals `consul_id`.
    ///
    /// Long-running operations answer with a correlation id; the matching
    /// task record shows up here once the task manager has picked it up, so
    /// an empty list is a normal answer.
    pub async fn get_task_by_consul_id(&self, consul_id: impl Into<ConsulId>) -> Result<Vec<Value>> {
        self.get_task_by_consul_id_with(consul_id, RequestOptions::new())
            .await
    }

    /// [`VmSession::get_task_by_consul_id`] with extra request options. The
    /// `where` filter is appended after any query already on `options`.
    pub async fn get_task_by_consul_id_with(
        &self,
        consul_id: impl Into<ConsulId>,
        options: RequestOptions,
    ) -> Result<Vec<Value>> {
        let consul_id = consul_id.into();
        let mut filter = QueryParams::new();
        filter.push_filter(&Filter::eq("consul_id", consul_id.get()));
        let options = options.query_params(filter);

        let url = self.inner.url_for(TASK_PATH, options.query_pairs())?;
        let body = self.inner.get(TASK_PATH, options).await?;

        let tasks = ListResponse::from_body(url.as_str(), body)?.list;
        debug!(%consul_id, count = tasks.len(), "looked up tasks by consul id");
        Ok(tasks)
    }

    /// The first task matching `consul_id`, if the task manager knows it yet.
    pub async fn first_task_by_consul_id(
        &self,
        consul_id: impl Into<ConsulId>,
    ) -> Result<Option<Value>> {
        Ok(self
            .get_task_by_consul_id(consul_id)
            .await?
            .into_iter()
            .next())
    }
}
