//! The smallest embedding: one route answering `{"status": "OK"}`.
//!
//! ```sh
//! cargo run --example status_ok
//! curl -i http://127.0.0.1:9831/
//! ```

use fast_service::{EndpointTable, Method, NetParams, Service, StatusCode};

fn main() -> Result<(), fast_service::Error> {
    let table = EndpointTable::builder()
        .route("/", Method::Get, |_req, resp| {
            resp.status(StatusCode::Ok)
                .header("content-type", "application/json")
                .body(r#"{"status": "OK"}"#);
        })
        .build()?;

    let service = Service::new(NetParams::new(9831), table)?;
    println!("listening on {}", service.local_addr());

    service.run();
    Ok(())
}
