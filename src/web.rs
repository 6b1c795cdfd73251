use std::{convert::Infallible, net::SocketAddr};

use async_graphql_warp::GraphQLResponse;
use tracing::info;
use warp::Filter;

use crate::api::Schema;

/// Serves the GraphQL endpoint until the process exits.
pub async fn serve(schema: Schema, addr: SocketAddr) {
    let filter = async_graphql_warp::graphql(schema).and_then(
        |(schema, request): (Schema, async_graphql::Request)| async move {
            Ok::<_, Infallible>(GraphQLResponse::from(schema.execute(request).await))
        },
    );

    info!("Listening on {addr}");
    warp::serve(filter).run(addr).await;
}
