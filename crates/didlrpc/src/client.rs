//! # RPC Client
//!
//! Makes canister calls over a [`Transport`]: marshals the arguments, hands the
//! request over, and unmarshals the reply.

use std::sync::Arc;
use std::time::Duration;

use didlpack::Limits;
use didlpack::Principal;
use didlpack::TypeEnv;
use didlpack::WireType;

use crate::error::Result;
use crate::fields::FieldMap;
use crate::host::Host;
use crate::marshal::marshal_typed;
use crate::marshal::marshal_with;
use crate::marshal::unmarshal_typed;
use crate::marshal::unmarshal_with;
use crate::transport::CallKind;
use crate::transport::Request;
use crate::transport::Transport;
use crate::transport::TransportError;

/// A declared method signature for typed calls.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    pub env: TypeEnv,
    pub args: Vec<WireType>,
    pub rets: Vec<WireType>,
}

#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    fields: FieldMap,
    limits: Limits,
    timeout: Option<Duration>,
}

impl Client {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            fields: FieldMap::default(),
            limits: Limits::default(),
            timeout: None,
        }
    }

    pub fn with_fields(mut self, fields: FieldMap) -> Self {
        self.fields = fields;
        self
    }

    /// Limits applied when decoding replies.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// A read-only call. Argument types are inferred.
    pub async fn query(&self, canister: &Principal, method: &str, args: &[Host]) -> Result<Vec<Host>> {
        self.call(canister, method, CallKind::Query, args).await
    }

    /// A state-changing call. Argument types are inferred.
    pub async fn update(&self, canister: &Principal, method: &str, args: &[Host]) -> Result<Vec<Host>> {
        self.call(canister, method, CallKind::Update, args).await
    }

    async fn call(
        &self,
        canister: &Principal,
        method: &str,
        kind: CallKind,
        args: &[Host],
    ) -> Result<Vec<Host>> {
        let arg = marshal_with(args, &self.fields)?;
        let reply = self.send(canister, method, kind, arg).await?;
        unmarshal_with(&reply, &self.fields, self.limits)
    }

    /// A call against a declared signature: arguments are checked against
    /// `sig.args` and the reply is read through `sig.rets`.
    pub async fn call_typed(
        &self,
        canister: &Principal,
        method: &str,
        kind: CallKind,
        sig: &Signature,
        args: &[Host],
    ) -> Result<Vec<Host>> {
        let arg = marshal_typed(&sig.args, &sig.env, args, &self.fields)?;
        let reply = self.send(canister, method, kind, arg).await?;
        unmarshal_typed(&reply, &sig.rets, &sig.env, &self.fields, self.limits)
    }

    async fn send(
        &self,
        canister: &Principal,
        method: &str,
        kind: CallKind,
        arg: Vec<u8>,
    ) -> Result<Vec<u8>> {
        let request = Request {
            canister: canister.clone(),
            method: method.to_string(),
            kind,
            arg,
        };
        tracing::debug!(%canister, method, ?kind, bytes = request.arg.len(), "sending call");

        let reply = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.transport.call(&request))
                .await
                .map_err(|_| TransportError::Timeout)??,
            None => self.transport.call(&request).await?,
        };
        tracing::debug!(method, bytes = reply.len(), "received reply");
        Ok(reply)
    }
}
