//! A small JSON API: several routes, methods, query strings and bodies.
//!
//! ```sh
//! cargo run --example api_routes
//! curl -i http://127.0.0.1:9831/health
//! curl -i 'http://127.0.0.1:9831/greet?name=ada'
//! curl -i -X POST --data '{"item": 1}' http://127.0.0.1:9831/orders
//! ```

use fast_service::{EndpointTable, Method, NetParams, Service, StatusCode};

fn main() -> Result<(), fast_service::Error> {
    let table = EndpointTable::builder()
        .route("/health", Method::Get, |_req, resp| {
            resp.header("content-type", "application/json")
                .body(r#"{"healthy": true}"#);
        })
        .route("/greet", Method::Get, |req, resp| {
            let name = req
                .query()
                .and_then(|q| q.strip_prefix("name="))
                .unwrap_or("stranger");
            resp.header("content-type", "application/json");
            let body = resp.body_mut();
            body.push_str(r#"{"greeting": "hello, "#);
            body.push_str(name);
            body.push_str("\"}");
        })
        .route("/orders", Method::Post, |req, resp| {
            if req.body().is_empty() {
                resp.status(StatusCode::UnprocessableEntity)
                    .header("content-type", "application/json")
                    .body(r#"{"error": "empty order"}"#);
            } else {
                resp.status(StatusCode::Created)
                    .header("content-type", "application/json");
                let body = resp.body_mut();
                body.push_str(r#"{"received_bytes": "#);
                body.push_str(&req.body().len().to_string());
                body.push('}');
            }
        })
        .route("/orders", Method::Delete, |_req, resp| {
            resp.status(StatusCode::NoContent);
        })
        .build()?;

    let service = Service::new(NetParams::new(9831), table)?;
    println!("listening on {}", service.local_addr());

    service.run();
    Ok(())
}
