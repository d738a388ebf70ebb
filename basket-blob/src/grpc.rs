//! gRPC client for the `static.v1.Static` blob service.
//!
//! The wire contract, in proto terms:
//!
//! ```text
//! service Static {
//!   rpc Upload(stream UploadRequest) returns (UploadResponse);
//!   rpc Download(DownloadRequest) returns (stream DownloadResponse);
//!   rpc Delete(DeleteRequest) returns (DeleteResponse);
//! }
//! ```

use async_trait::async_trait;
use futures_core::Stream;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tonic::transport::{Channel, Endpoint};
use tracing::debug;

use crate::{BlobBackend, BlobError, BlobResult, ByteStream, GrpcBackendConfig, SourceRef};

pub mod proto {
    use tonic::codegen::http::uri::PathAndQuery;
    use tonic::transport::Channel;

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct UploadRequest {
        #[prost(bytes = "bytes", tag = "1")]
        pub data: ::bytes::Bytes,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct UploadResponse {
        #[prost(string, tag = "1")]
        pub source_id: ::prost::alloc::string::String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct DownloadRequest {
        #[prost(string, tag = "1")]
        pub source_id: ::prost::alloc::string::String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct DownloadResponse {
        #[prost(bytes = "bytes", tag = "1")]
        pub data: ::bytes::Bytes,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct DeleteRequest {
        #[prost(string, tag = "1")]
        pub source_id: ::prost::alloc::string::String,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct DeleteResponse {}

    /// Thin client over a tonic channel, one method per RPC.
    #[derive(Debug, Clone)]
    pub struct StaticClient {
        inner: tonic::client::Grpc<Channel>,
    }

    impl StaticClient {
        pub fn new(channel: Channel) -> Self {
            Self {
                inner: tonic::client::Grpc::new(channel),
            }
        }

        async fn ready(&mut self) -> Result<(), tonic::Status> {
            self.inner
                .ready()
                .await
                .map_err(|e| tonic::Status::unknown(format!("Service was not ready: {e}")))
        }

        pub async fn upload(
            &mut self,
            request: impl tonic::IntoStreamingRequest<Message = UploadRequest>,
        ) -> Result<tonic::Response<UploadResponse>, tonic::Status> {
            self.ready().await?;
            let codec = tonic::codec::ProstCodec::default();
            let path = PathAndQuery::from_static("/static.v1.Static/Upload");
            self.inner
                .client_streaming(request.into_streaming_request(), path, codec)
                .await
        }

        pub async fn download(
            &mut self,
            request: impl tonic::IntoRequest<DownloadRequest>,
        ) -> Result<tonic::Response<tonic::codec::Streaming<DownloadResponse>>, tonic::Status> {
            self.ready().await?;
            let codec = tonic::codec::ProstCodec::default();
            let path = PathAndQuery::from_static("/static.v1.Static/Download");
            self.inner
                .server_streaming(request.into_request(), path, codec)
                .await
        }

        pub async fn delete(
            &mut self,
            request: impl tonic::IntoRequest<DeleteRequest>,
        ) -> Result<tonic::Response<DeleteResponse>, tonic::Status> {
            self.ready().await?;
            let codec = tonic::codec::ProstCodec::default();
            let path = PathAndQuery::from_static("/static.v1.Static/Delete");
            self.inner.unary(request.into_request(), path, codec).await
        }
    }
}

use proto::{DeleteRequest, DownloadRequest, StaticClient, UploadRequest};

/// [`BlobBackend`] backed by the remote `Static` gRPC service.
#[derive(Debug, Clone)]
pub struct GrpcBlobBackend {
    client: StaticClient,
    config: GrpcBackendConfig,
}

impl GrpcBlobBackend {
    /// Build a client whose channel dials on first use.
    pub fn connect_lazy(config: GrpcBackendConfig) -> BlobResult<Self> {
        let channel = Self::endpoint(&config)?.connect_lazy();
        Ok(Self::from_channel(channel, config))
    }

    /// Build a client and dial immediately.
    pub async fn connect(config: GrpcBackendConfig) -> BlobResult<Self> {
        let channel = Self::endpoint(&config)?.connect().await?;
        Ok(Self::from_channel(channel, config))
    }

    pub fn from_channel(channel: Channel, config: GrpcBackendConfig) -> Self {
        Self {
            client: StaticClient::new(channel),
            config,
        }
    }

    pub fn config(&self) -> &GrpcBackendConfig {
        &self.config
    }

    fn endpoint(config: &GrpcBackendConfig) -> BlobResult<Endpoint> {
        Ok(Endpoint::from_shared(config.endpoint_uri())?.connect_timeout(config.connect_timeout))
    }
}

/// Upload messages until the `None` marker. A sender dropped without the
/// marker leaves the stream pending until the RPC itself is dropped.
fn request_stream(rx: mpsc::Receiver<Option<UploadRequest>>) -> impl Stream<Item = UploadRequest> + Send + 'static {
    futures_util::stream::unfold(rx, |mut rx| async move {
        match rx.recv().await {
            Some(Some(message)) => Some((message, rx)),
            Some(None) => None,
            None => std::future::pending().await,
        }
    })
}

fn status_to_io(status: tonic::Status) -> std::io::Error {
    std::io::Error::other(status)
}

#[async_trait]
impl BlobBackend for GrpcBlobBackend {
    async fn upload(&self, mut body: ByteStream) -> BlobResult<SourceRef> {
        let (tx, rx) = mpsc::channel::<Option<UploadRequest>>(self.config.upload_buffer);
        let mut client = self.client.clone();

        let call = async move {
            client
                .upload(request_stream(rx))
                .await
                .map_err(BlobError::from)
        };

        // Returning an error drops `call`, which resets the RPC. The request
        // stream only ends cleanly on the `None` marker, so a failed read
        // can never look like a complete upload to the backend.
        let pump = async move {
            while let Some(chunk) = body.next().await {
                let data = chunk?;
                if tx.send(Some(UploadRequest { data })).await.is_err() {
                    // Backend hung up; its status comes back through `call`.
                    return Ok(());
                }
            }
            let _ = tx.send(None).await;
            Ok::<(), BlobError>(())
        };

        let ((), response) = tokio::try_join!(pump, call)?;
        let source_id = response.into_inner().source_id;
        if source_id.is_empty() {
            return Err(BlobError::upload_failed("backend returned an empty source id"));
        }

        Ok(SourceRef::new(source_id))
    }

    async fn download(&self, source_ref: &SourceRef) -> BlobResult<ByteStream> {
        let mut client = self.client.clone();
        let response = client
            .download(DownloadRequest {
                source_id: source_ref.to_string(),
            })
            .await
            .map_err(|status| match status.code() {
                tonic::Code::NotFound => BlobError::not_found(source_ref.as_str()),
                _ => BlobError::from(status),
            })?;

        let stream = response
            .into_inner()
            .map(|message| message.map(|m| m.data).map_err(status_to_io));

        Ok(Box::pin(stream))
    }

    async fn delete(&self, source_ref: &SourceRef) -> BlobResult<()> {
        let mut client = self.client.clone();
        match client
            .delete(DeleteRequest {
                source_id: source_ref.to_string(),
            })
            .await
        {
            Ok(_) => Ok(()),
            Err(status) if status.code() == tonic::Code::NotFound => {
                debug!(%source_ref, "blob already absent on backend");
                Ok(())
            }
            Err(status) => Err(status.into()),
        }
    }
}
