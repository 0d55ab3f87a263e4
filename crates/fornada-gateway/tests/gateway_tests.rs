// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use fornada_gateway::{Gateway, GatewayErrorKind, HttpGateway, OrderQuery, OrderScope, OrderSort};
use fornada_app::{OrderId, OrderStatus, UserId, YearMonth};
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Response, Server};

fn gateway(addr: &str) -> Result<HttpGateway> {
    HttpGateway::new(addr, "anon-key", Some("session-token".to_owned()), Duration::from_secs(1))
        .map_err(|error| anyhow!(error))
}

fn json_response(body: &str) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(body).with_status_code(200).with_header(
        Header::from_bytes("Content-Type", "application/json").expect("valid content type header"),
    )
}

#[test]
fn unreachable_service_reports_connection_kind() {
    let mut gateway = gateway("http://127.0.0.1:1").expect("gateway should initialize");

    let error = gateway
        .list_orders(&OrderQuery::default())
        .expect_err("unreachable service should fail");
    assert_eq!(error.kind, GatewayErrorKind::Connection);
    assert!(error.message.contains("cannot reach"));
}

#[test]
fn list_orders_scopes_to_customer_and_decodes_rows() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(
            request.url(),
            "/rest/v1/pedidos?select=*&id_cliente=eq.cliente-1&order=id.desc"
        );
        let body = r#"[{
            "id": 2,
            "id_cliente": "cliente-1",
            "admin_id": "admin-1",
            "tema": "Unicórnio",
            "status_pedido": "aprovado",
            "data_pedido": "2026-08-01T10:30:00Z"
        }]"#;
        request
            .respond(json_response(body))
            .expect("response should succeed");
    });

    let mut gateway = gateway(&addr)?;
    let orders = gateway.list_orders(&OrderQuery {
        scope: OrderScope::Customer(UserId::from("cliente-1")),
        sort: OrderSort::IdDesc,
    })?;

    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].theme, "Unicórnio");
    assert_eq!(orders[0].status, OrderStatus::Aprovado);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn get_order_maps_empty_result_to_not_found() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/rest/v1/pedidos?select=*&id=eq.99");
        request
            .respond(json_response("[]"))
            .expect("response should succeed");
    });

    let mut gateway = gateway(&addr)?;
    let error = gateway
        .get_order(OrderId::new(99))
        .expect_err("missing order should fail");
    assert_eq!(error.kind, GatewayErrorKind::NotFound);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn missing_session_is_logged_out_not_an_error() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/auth/v1/user");
        let response = Response::from_string(r#"{"msg":"missing sub claim"}"#).with_status_code(401);
        request.respond(response).expect("response should succeed");
    });

    let mut gateway = gateway(&addr)?;
    let session = gateway.current_user().map_err(|error| anyhow!(error))?;
    assert!(session.is_none());

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn password_reset_rate_limit_is_classified() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/auth/v1/recover");
        let response = Response::from_string(r#"{"msg":"Too Many Requests"}"#).with_status_code(429);
        request.respond(response).expect("response should succeed");
    });

    let mut gateway = gateway(&addr)?;
    let error = gateway
        .request_password_reset("maria@example.com")
        .expect_err("rate-limited reset should fail");
    assert_eq!(error.kind, GatewayErrorKind::RateLimited);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn monthly_count_uses_range_query_and_content_range_total() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(
            request.url(),
            "/rest/v1/pedidos?select=id&admin_id=eq.admin-1&data_evento=gte.2026-08-01&data_evento=lte.2026-08-31"
        );
        let prefer = request
            .headers()
            .iter()
            .find(|header| header.field.equiv("Prefer"))
            .map(|header| header.value.as_str().to_owned());
        assert_eq!(prefer.as_deref(), Some("count=exact"));

        let response = json_response("[]").with_header(
            Header::from_bytes("Content-Range", "0-0/5").expect("valid content range header"),
        );
        request.respond(response).expect("response should succeed");
    });

    let mut gateway = gateway(&addr)?;
    let count = gateway
        .count_orders_in_month(
            &UserId::from("admin-1"),
            YearMonth::parse("2026-08").expect("valid month"),
        )
        .map_err(|error| anyhow!(error))?;
    assert_eq!(count, 5);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn service_error_message_reaches_the_caller() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        let response =
            Response::from_string(r#"{"message":"permission denied for table pedidos"}"#)
                .with_status_code(403);
        request.respond(response).expect("response should succeed");
    });

    let mut gateway = gateway(&addr)?;
    let error = gateway
        .delete_order(OrderId::new(3))
        .expect_err("forbidden delete should fail");
    assert_eq!(error.kind, GatewayErrorKind::PermissionDenied);
    assert!(error.message.contains("permission denied"));

    handle.join().expect("server thread should join");
    Ok(())
}
