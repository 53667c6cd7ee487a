mod common;

use axum::http::{Method, StatusCode};
use common::{line, TestApp};
use serde_json::json;

#[tokio::test]
async fn create_then_read_transaction() {
    let app = TestApp::new().await;
    app.seed_product("P1", "Pen", 10, 1000).await;
    app.seed_cashier(1, "Ana", "Cruz").await;

    let (status, body) = app
        .post(
            "/createSalesTransaction",
            json!({
                "orNumber": "OR1",
                "user_id": 1,
                "items": [line("P1", 5, 10.0)],
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["transactionId"], "ST-S00001");
    assert_eq!(body["transaction"]["total_Sales"].as_f64(), Some(50.0));
    assert_eq!(body["transaction"]["profit"].as_f64(), Some(0.0));
    assert_eq!(body["transaction"]["items"][0]["itemId"], "TI-00001");
    assert_eq!(app.stock("P1").await, 5);

    let (status, body) = app.get("/getTransaction/ST-S00001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cashierName"], "Ana Cruz");
    assert_eq!(body["transaction"]["orNumber"], "OR1");
    assert_eq!(body["transaction"]["items"][0]["quantity"], 5);
    assert_eq!(body["transaction"]["items"][0]["description"], "Pen");
}

#[tokio::test]
async fn duplicate_receipt_number_is_a_conflict() {
    let app = TestApp::new().await;
    app.seed_product("P1", "Pen", 10, 1000).await;
    app.sell("OR1", "P1", 2, 10.0).await;

    let (status, body) = app
        .post(
            "/createSalesTransaction",
            json!({ "orNumber": "OR1", "items": [line("P1", 1, 10.0)] }),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
    assert_eq!(app.stock("P1").await, 8);
}

#[tokio::test]
async fn invalid_items_are_all_reported() {
    let app = TestApp::new().await;
    app.seed_product("P1", "Pen", 10, 1000).await;

    let (status, body) = app
        .post(
            "/createSalesTransaction",
            json!({
                "orNumber": "OR1",
                "items": [
                    { "quantity": 1, "unitPrice": 10, "totalPrice": 10, "description": "Pen" },
                    line("P1", 1, 10.0),
                    { "product_id": "P1", "unitPrice": 10, "totalPrice": 10 },
                ],
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    let indexes: Vec<u64> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["index"].as_u64().unwrap())
        .collect();
    assert_eq!(indexes, vec![0, 2]);

    let (status, _) = app
        .post("/createSalesTransaction", json!({ "orNumber": "OR2", "items": [] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(app.stock("P1").await, 10);
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let app = TestApp::new().await;

    let (status, body) = app
        .post("/createSalesTransaction", json!({ "orNumber": "OR1", "items": "nope" }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn oversized_amounts_are_rejected() {
    let app = TestApp::new().await;
    app.seed_product("P1", "Pen", 10, 1000).await;

    let huge = json!({
        "product_id": "P1",
        "quantity": 1,
        "unitPrice": 10,
        "totalPrice": "50000000000000000",
        "description": "Pen",
    });
    let (status, body) = app
        .post(
            "/createSalesTransaction",
            json!({ "orNumber": "OR1", "items": [huge.clone(), huge] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"].as_array().unwrap().len(), 2);

    let (status, body) = app
        .post(
            "/createSalesTransaction",
            json!({
                "orNumber": "OR1",
                "total_Sales": "2000000000",
                "items": [line("P1", 1, 10.0)],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(app.stock("P1").await, 10);
}

#[tokio::test]
async fn insufficient_stock_leaves_nothing_behind() {
    let app = TestApp::new().await;
    app.seed_product("P1", "Pen", 3, 1000).await;
    app.seed_product("P2", "Pad", 10, 500).await;

    let (status, body) = app
        .post(
            "/createSalesTransaction",
            json!({
                "orNumber": "OR1",
                "items": [line("P2", 2, 5.0), line("P1", 4, 10.0)],
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");
    assert_eq!(app.stock("P1").await, 3);
    assert_eq!(app.stock("P2").await, 10);

    let (status, body) = app.send(Method::POST, "/findsalestransaction", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn update_moves_stock_by_the_difference() {
    let app = TestApp::new().await;
    app.seed_product("P1", "Pen", 10, 1000).await;
    app.seed_product("P2", "Pad", 10, 500).await;
    let id = app.sell("OR1", "P1", 5, 10.0).await;

    let (status, body) = app
        .put(
            &format!("/updateSalesTransaction/{id}"),
            json!({
                "total_Sales": "35.00",
                "items": [line("P1", 2, 10.0), line("P2", 3, 5.0)],
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["transaction"]["total_Sales"].as_f64(), Some(35.0));
    assert_eq!(body["transaction"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(app.stock("P1").await, 8);
    assert_eq!(app.stock("P2").await, 7);
}

#[tokio::test]
async fn empty_update_deletes_and_restores_stock() {
    let app = TestApp::new().await;
    app.seed_product("P1", "Pen", 10, 1000).await;
    let id = app.sell("OR1", "P1", 4, 10.0).await;

    let (status, body) = app
        .put(&format!("/updateSalesTransaction/{id}"), json!({ "items": [] }))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(app.stock("P1").await, 10);

    let (status, _) = app.get(&format!("/getTransaction/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_update_of_refunded_transaction_changes_nothing() {
    let app = TestApp::new().await;
    app.seed_product("P1", "Pen", 10, 1000).await;
    let id = app.sell("OR1", "P1", 5, 10.0).await;

    let (status, _) = app
        .put(
            &format!("/createRefundTransaction/{id}"),
            json!({ "reason": "damaged", "items": [
                { "product_id": "P1", "quantity": 1, "totalPrice": 10 }
            ]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.stock("P1").await, 6);

    let (status, body) = app
        .put(&format!("/updateSalesTransaction/{id}"), json!({ "items": [] }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    assert_eq!(app.stock("P1").await, 6);
    let items = app.db.sales().items(&id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 4);
}

#[tokio::test]
async fn unknown_transactions_are_not_found() {
    let app = TestApp::new().await;
    app.seed_product("P1", "Pen", 10, 1000).await;

    let (status, body) = app
        .put(
            "/updateSalesTransaction/ST-S09999",
            json!({ "items": [line("P1", 1, 10.0)] }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = app
        .send(Method::DELETE, "/deleteTransaction/ST-S09999", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/getTransaction/ST-S09999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_keeps_stock_and_refund_records() {
    let app = TestApp::new().await;
    app.seed_product("P1", "Pen", 10, 1000).await;
    let id = app.sell("OR1", "P1", 5, 10.0).await;

    app.put(
        &format!("/createRefundTransaction/{id}"),
        json!({ "items": [{ "product_id": "P1", "quantity": 2, "totalPrice": 20 }] }),
    )
    .await;

    let (status, body) = app
        .send(Method::DELETE, &format!("/deleteTransaction/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(app.stock("P1").await, 7);

    let (status, body) = app.send(Method::POST, "/findrefund", None).await;
    assert_eq!(status, StatusCode::OK);
    let refunds = body.as_array().unwrap();
    assert_eq!(refunds.len(), 1);
    assert!(refunds[0]["transactionId"].is_null());
    assert_eq!(refunds[0]["items"][0]["description"], "Pen");
}

#[tokio::test]
async fn listing_is_newest_first_and_paginates() {
    let app = TestApp::new().await;
    app.seed_product("P1", "Pen", 10, 1000).await;
    app.seed_cashier(1, "Ana", "Cruz").await;

    for (or_number, date) in [("OR1", "2024-01-01T08:00:00Z"), ("OR2", "2024-01-02T08:00:00Z")] {
        let (status, _) = app
            .post(
                "/createSalesTransaction",
                json!({
                    "orNumber": or_number,
                    "user_id": 1,
                    "transaction_Date": date,
                    "items": [line("P1", 1, 10.0)],
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    app.post(
        "/createSalesTransaction",
        json!({
            "orNumber": "OR3",
            "user_id": 42,
            "transaction_Date": "2023-12-31T08:00:00Z",
            "items": [line("P1", 1, 10.0)],
        }),
    )
    .await;

    let (status, body) = app.send(Method::POST, "/findsalestransaction", None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    let receipts: Vec<&str> = rows.iter().map(|r| r["orNumber"].as_str().unwrap()).collect();
    assert_eq!(receipts, vec!["OR2", "OR1", "OR3"]);
    assert_eq!(rows[0]["cashierName"], "Ana Cruz");
    assert_eq!(rows[2]["cashierName"], "Unknown");
    assert_eq!(rows[0]["transactionItems"].as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["totalSales"].as_f64(), Some(10.0));

    let (_, body) = app
        .post("/findsalestransaction", json!({ "limit": 1, "offset": 1 }))
        .await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["orNumber"], "OR1");
}
