use {
  super::*,
  axum::{
    extract::{Extension, Path as RoutePath},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
  },
  tokio::runtime::Runtime,
};

#[derive(Debug, Parser)]
pub(crate) struct Server {
  #[arg(
    long,
    env = "SERVER_PORT",
    default_value = "3000",
    help = "Listen on <PORT>."
  )]
  port: u16,
}

impl Server {
  pub(crate) fn run(self, settings: Settings) -> Result {
    let node = Arc::new(settings.node()?);

    Runtime::new()?.block_on(async {
      let router = Router::new()
        .route("/tx/{txid}", get(Self::tx))
        .layer(Extension(node));

      let listener = tokio::net::TcpListener::bind(("0.0.0.0", self.port)).await?;

      log::info!("listening on http://{}", listener.local_addr()?);

      axum::serve(listener, router).await?;

      Ok(())
    })
  }

  async fn tx(
    Extension(node): Extension<Arc<CoreClient>>,
    RoutePath(txid): RoutePath<String>,
  ) -> Response {
    let Ok(txid) = txid.parse::<Txid>() else {
      return (StatusCode::BAD_REQUEST, format!("invalid txid: {txid}")).into_response();
    };

    // extraction does blocking RPC round trips
    match tokio::task::spawn_blocking(move || crate::extract::extract(node.as_ref(), txid)).await
    {
      Ok(Ok(envelope)) => (
        [(
          header::CONTENT_TYPE,
          HeaderValue::from_str(&envelope.content_type)
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
        )],
        envelope.body,
      )
        .into_response(),
      Ok(Err(err)) => (StatusCode::NOT_FOUND, err.to_string()).into_response(),
      Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
  }
}
