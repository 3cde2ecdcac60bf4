//! The generic state-of-the-world discovery service.
//!
//! One implementation serves all four resource types; a
//! [`DiscoverySource`] supplies the type URL, the gRPC method names, and
//! versioned snapshots of the backing cache.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use isobar_types::discovery::{DiscoveryRequest, DiscoveryResponse};
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::stream::StreamContext;

/// A versioned snapshot taken from a source.
#[derive(Debug, Clone)]
pub struct SourceSnapshot {
    /// The cache version at the moment of assembly.
    pub version: String,
    /// Every resource, as (name, encoded Any) pairs in name order.
    pub resources: Vec<(String, prost_types::Any)>,
}

/// A cache serving one resource type over discovery.
pub trait DiscoverySource: Send + Sync + 'static {
    /// Type URL of the resources this source serves.
    const TYPE_URL: &'static str;
    /// Fully-qualified gRPC service name.
    const SERVICE_NAME: &'static str;
    /// Name of the streaming method.
    const STREAM_METHOD: &'static str;
    /// Name of the unary fetch method.
    const FETCH_METHOD: &'static str;

    /// Take a versioned snapshot of the current contents.
    fn fetch(&self) -> SourceSnapshot;

    /// Subscribe to the backing cache's change signal.
    fn subscribe(&self) -> watch::Receiver<u64>;
}

/// Assemble a response from a source snapshot, applying the client's
/// resource-name filter. An empty filter returns every resource; the
/// nonce equals the version.
pub(crate) fn assemble<S: DiscoverySource>(source: &S, names: &[String]) -> DiscoveryResponse {
    let snapshot = source.fetch();
    let resources = snapshot
        .resources
        .into_iter()
        .filter(|(name, _)| names.is_empty() || names.iter().any(|n| n == name))
        .map(|(_, any)| any)
        .collect();
    DiscoveryResponse {
        version_info: snapshot.version.clone(),
        resources,
        canary: false,
        type_url: S::TYPE_URL.to_string(),
        nonce: snapshot.version,
    }
}

/// The discovery service for one resource type.
pub struct DiscoveryService<S> {
    source: Arc<S>,
    stop: watch::Receiver<bool>,
    queue: usize,
}

impl<S> Clone for DiscoveryService<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            stop: self.stop.clone(),
            queue: self.queue,
        }
    }
}

impl<S: DiscoverySource> DiscoveryService<S> {
    /// Create a service over a source.
    pub fn new(source: Arc<S>, stop: watch::Receiver<bool>, config: &ServerConfig) -> Self {
        Self {
            source,
            stop,
            queue: config.stream_queue,
        }
    }

    /// Single-shot fetch: one filtered snapshot at the current version.
    pub async fn fetch(
        &self,
        request: Request<DiscoveryRequest>,
    ) -> Result<Response<DiscoveryResponse>, Status> {
        let request = request.into_inner();
        validate_type_url::<S>(&request.type_url)?;
        Ok(Response::new(assemble(&*self.source, &request.resource_names)))
    }

    /// Long-lived watch.
    ///
    /// The first client request establishes the resource-name filter; one
    /// response is sent immediately and another after every change signal.
    /// Later requests (ACKs) may narrow or widen the filter but do not
    /// trigger a send of their own.
    pub async fn stream(
        &self,
        request: Request<Streaming<DiscoveryRequest>>,
    ) -> Result<Response<ReceiverStream<Result<DiscoveryResponse, Status>>>, Status> {
        let mut inbound = request.into_inner();
        let (tx, rx) = mpsc::channel(self.queue);
        let source = Arc::clone(&self.source);
        let mut stop = self.stop.clone();
        let ctx = StreamContext::new();

        info!(stream = %ctx.id(), type_url = S::TYPE_URL, "stream started");

        tokio::spawn(async move {
            // the first request carries the filter
            let mut names = tokio::select! {
                _ = stop.changed() => return,
                first = inbound.next() => match first {
                    Some(Ok(request)) => {
                        ctx.record_request();
                        if let Err(status) = validate_type_url::<S>(&request.type_url) {
                            let _ = tx.try_send(Err(status));
                            return;
                        }
                        request.resource_names
                    }
                    Some(Err(err)) => {
                        debug!(stream = %ctx.id(), error = %err, "stream error before first request");
                        return;
                    }
                    None => return,
                },
            };

            let mut changed = source.subscribe();

            'serve: loop {
                let response = assemble(&*source, &names);
                ctx.record_response();
                match tx.try_send(Ok(response)) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!(
                            stream = %ctx.id(),
                            type_url = S::TYPE_URL,
                            "slow client overflowed its queue, closing stream"
                        );
                        let _ = tx.try_send(Err(Status::resource_exhausted(
                            "response queue overflow",
                        )));
                        break 'serve;
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => break 'serve,
                }

                // wait for the next reason to send
                loop {
                    tokio::select! {
                        _ = stop.changed() => break 'serve,
                        signal = changed.changed() => {
                            if signal.is_err() {
                                break 'serve;
                            }
                            continue 'serve;
                        }
                        request = inbound.next() => match request {
                            Some(Ok(request)) => {
                                // an ACK, possibly updating the filter
                                ctx.record_request();
                                names = request.resource_names;
                            }
                            Some(Err(err)) => {
                                debug!(stream = %ctx.id(), error = %err, "stream error");
                                break 'serve;
                            }
                            None => break 'serve,
                        },
                    }
                }
            }

            info!(
                stream = %ctx.id(),
                requests = ctx.request_count(),
                responses = ctx.response_count(),
                "stream ended"
            );
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }
}

fn validate_type_url<S: DiscoverySource>(type_url: &str) -> Result<(), Status> {
    if !type_url.is_empty() && type_url != S::TYPE_URL {
        return Err(Status::invalid_argument(format!(
            "unexpected type URL {type_url}, this endpoint serves {}",
            S::TYPE_URL
        )));
    }
    Ok(())
}

type BoxFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send>>;

/// Tonic transport wrapper routing the service's two methods.
pub struct DiscoveryGrpc<S> {
    inner: DiscoveryService<S>,
}

impl<S> Clone for DiscoveryGrpc<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: DiscoverySource> DiscoveryGrpc<S> {
    /// Wrap a discovery service for registration on a tonic server.
    pub fn new(inner: DiscoveryService<S>) -> Self {
        Self { inner }
    }
}

struct StreamMethod<S>(DiscoveryService<S>);

impl<S: DiscoverySource> tonic::server::StreamingService<DiscoveryRequest> for StreamMethod<S> {
    type Response = DiscoveryResponse;
    type ResponseStream = ReceiverStream<Result<DiscoveryResponse, Status>>;
    type Future = BoxFuture<Response<Self::ResponseStream>, Status>;

    fn call(&mut self, request: Request<Streaming<DiscoveryRequest>>) -> Self::Future {
        let svc = self.0.clone();
        Box::pin(async move { svc.stream(request).await })
    }
}

struct FetchMethod<S>(DiscoveryService<S>);

impl<S: DiscoverySource> tonic::server::UnaryService<DiscoveryRequest> for FetchMethod<S> {
    type Response = DiscoveryResponse;
    type Future = BoxFuture<Response<Self::Response>, Status>;

    fn call(&mut self, request: Request<DiscoveryRequest>) -> Self::Future {
        let svc = self.0.clone();
        Box::pin(async move { svc.fetch(request).await })
    }
}

impl<S: DiscoverySource> tonic::codegen::Service<http::Request<tonic::body::BoxBody>>
    for DiscoveryGrpc<S>
{
    type Response = http::Response<tonic::body::BoxBody>;
    type Error = std::convert::Infallible;
    type Future = Pin<
        Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<tonic::body::BoxBody>) -> Self::Future {
        let inner = self.inner.clone();
        let method = req
            .uri()
            .path()
            .strip_prefix('/')
            .and_then(|p| p.split_once('/'))
            .filter(|(service, _)| *service == S::SERVICE_NAME)
            .map(|(_, method)| method.to_string());

        match method.as_deref() {
            m if m == Some(S::STREAM_METHOD) => Box::pin(async move {
                let codec = tonic::codec::ProstCodec::default();
                let mut grpc = tonic::server::Grpc::new(codec);
                Ok(grpc.streaming(StreamMethod(inner), req).await)
            }),
            m if m == Some(S::FETCH_METHOD) => Box::pin(async move {
                let codec = tonic::codec::ProstCodec::default();
                let mut grpc = tonic::server::Grpc::new(codec);
                Ok(grpc.unary(FetchMethod(inner), req).await)
            }),
            _ => Box::pin(async move {
                Ok(http::Response::builder()
                    .status(http::StatusCode::OK)
                    .header("grpc-status", (tonic::Code::Unimplemented as i32).to_string())
                    .header("content-type", "application/grpc")
                    .body(tonic::body::empty_body())
                    .unwrap())
            }),
        }
    }
}

impl<S: DiscoverySource> tonic::server::NamedService for DiscoveryGrpc<S> {
    const NAME: &'static str = S::SERVICE_NAME;
}

#[cfg(test)]
mod tests {
    use super::*;
    use isobar_cache::ClusterCache;
    use isobar_types::cluster::Cluster;

    use crate::services::ClusterSource;

    fn cache_with(names: &[&str]) -> Arc<ClusterCache> {
        let cache = ClusterCache::new();
        cache.add(names.iter().map(|n| Cluster {
            name: (*n).to_string(),
            ..Default::default()
        }));
        Arc::new(cache)
    }

    #[test]
    fn assemble_returns_everything_for_an_empty_filter() {
        let source = ClusterSource::new(cache_with(&["a", "b"]));
        let response = assemble(&source, &[]);
        assert_eq!(response.resources.len(), 2);
        assert_eq!(response.version_info, "1");
        assert_eq!(response.nonce, response.version_info);
        assert_eq!(response.type_url, isobar_types::type_url::CLUSTER);
    }

    #[test]
    fn assemble_filters_by_resource_name() {
        let source = ClusterSource::new(cache_with(&["a", "b", "c"]));
        let response = assemble(&source, &["b".to_string(), "missing".to_string()]);
        assert_eq!(response.resources.len(), 1);
    }

    #[tokio::test]
    async fn fetch_validates_the_type_url() {
        let source = Arc::new(ClusterSource::new(cache_with(&["a"])));
        let (_tx, stop) = watch::channel(false);
        let svc = DiscoveryService::new(source, stop, &ServerConfig::default());

        let bad = Request::new(DiscoveryRequest {
            type_url: "type.googleapis.com/envoy.api.v2.Listener".to_string(),
            ..Default::default()
        });
        let err = svc.fetch(bad).await.unwrap_err();
        assert_eq!(err.code(), tonic::Code::InvalidArgument);

        let good = Request::new(DiscoveryRequest::default());
        let response = svc.fetch(good).await.unwrap().into_inner();
        assert_eq!(response.resources.len(), 1);
    }
}
