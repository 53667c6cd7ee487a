mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn partial_refund_scenario() {
    let app = TestApp::new().await;
    app.seed_product("P1", "Pen", 10, 1000).await;
    let id = app.sell("OR1", "P1", 5, 10.0).await;
    assert_eq!(app.stock("P1").await, 5);

    let (status, body) = app
        .put(
            &format!("/createRefundTransaction/{id}"),
            json!({
                "reason": "damaged",
                "grandTotal": 20,
                "items": [{ "product_id": "P1", "quantity": 2, "totalPrice": 20 }],
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["refundId"], "RF-00001");
    assert_eq!(body["transactionTotal"].as_f64(), Some(30.0));
    assert_eq!(body["refund"]["items"][0]["transactionItemId"], "TI-00001");

    assert_eq!(app.stock("P1").await, 7);

    let items = app.db.sales().items(&id).await.unwrap();
    assert_eq!(items[0].quantity, 3);
    assert_eq!(items[0].total_price_cents, 3000);
    let transaction = app.db.sales().get(&id).await.unwrap().unwrap();
    assert_eq!(transaction.total_sales_cents, 3000);

    let (status, body) = app.get(&format!("/getRefund/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    let refunds = body.as_array().unwrap();
    assert_eq!(refunds.len(), 1);
    assert_eq!(refunds[0]["reason"], "damaged");
    assert_eq!(refunds[0]["totalRefundAmount"], "20.00");
    assert_eq!(refunds[0]["refundedItems"][0]["refundedAmount"], "20.00");
    assert_eq!(refunds[0]["refundedItems"][0]["refundedQuantity"], 2);
}

#[tokio::test]
async fn refund_matched_by_item_key() {
    let app = TestApp::new().await;
    app.seed_product("P1", "Pen", 20, 1000).await;
    app.seed_cashier(1, "Ana", "Cruz").await;

    let (status, body) = app
        .post(
            "/createSalesTransaction",
            json!({
                "orNumber": "OR1",
                "user_id": 1,
                "items": [
                    { "product_id": "P1", "quantity": 2, "unitPrice": 10, "totalPrice": 20, "description": "Pen" },
                    { "product_id": "P1", "quantity": 3, "unitPrice": 9, "totalPrice": 27, "description": "Pen (promo)" },
                ],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["transactionId"].as_str().unwrap().to_string();

    let (status, _) = app
        .put(
            &format!("/createRefundTransaction/{id}"),
            json!({ "items": [{
                "transactionItemId": "TI-00002",
                "product_id": "P1",
                "quantity": 3,
                "totalPrice": 27,
            }]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let items = app.db.sales().items(&id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].item_id, "TI-00001");
    assert_eq!(app.stock("P1").await, 18);

    let (_, body) = app.send(Method::POST, "/findrefund", None).await;
    assert_eq!(body[0]["items"][0]["description"], "Pen (promo)");
    assert_eq!(body[0]["totalRefundAmount"].as_f64(), Some(27.0));
}

#[tokio::test]
async fn over_refund_is_rejected_without_effects() {
    let app = TestApp::new().await;
    app.seed_product("P1", "Pen", 10, 1000).await;
    let id = app.sell("OR1", "P1", 5, 10.0).await;

    let (status, body) = app
        .put(
            &format!("/createRefundTransaction/{id}"),
            json!({ "items": [{ "product_id": "P1", "quantity": 6, "totalPrice": 60 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["index"], 0);

    let (status, _) = app
        .put(
            &format!("/createRefundTransaction/{id}"),
            json!({ "items": [{ "product_id": "P9", "quantity": 1, "totalPrice": 10 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .put(&format!("/createRefundTransaction/{id}"), json!({ "items": [] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .put(
            &format!("/createRefundTransaction/{id}"),
            json!({
                "grandTotal": "90000000000000000",
                "items": [{ "product_id": "P1", "quantity": 1, "totalPrice": 10 }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(app.stock("P1").await, 5);
    let (_, body) = app.get(&format!("/getRefund/{id}")).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn refund_of_unknown_transaction_is_not_found() {
    let app = TestApp::new().await;

    let (status, _) = app
        .put(
            "/createRefundTransaction/ST-S09999",
            json!({ "items": [{ "product_id": "P1", "quantity": 1, "totalPrice": 10 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/getRefund/ST-S09999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_refund_keeps_its_effects() {
    let app = TestApp::new().await;
    app.seed_product("P1", "Pen", 10, 1000).await;
    let id = app.sell("OR1", "P1", 5, 10.0).await;

    let (_, body) = app
        .put(
            &format!("/createRefundTransaction/{id}"),
            json!({ "items": [{ "product_id": "P1", "quantity": 2, "totalPrice": 20 }] }),
        )
        .await;
    let refund_id = body["refundId"].as_str().unwrap().to_string();

    let (status, body) = app
        .send(Method::DELETE, "/deleteRefund", Some(json!({ "refundId": refund_id })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    assert_eq!(app.stock("P1").await, 7);
    let transaction = app.db.sales().get(&id).await.unwrap().unwrap();
    assert_eq!(transaction.total_sales_cents, 3000);

    let (status, _) = app
        .send(Method::DELETE, "/deleteRefund", Some(json!({ "refundId": refund_id })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send(Method::DELETE, "/deleteRefund", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn replacement_roundtrip_has_no_stock_effect() {
    let app = TestApp::new().await;
    app.seed_product("P1", "Pen", 10, 1000).await;
    let id = app.sell("OR1", "P1", 2, 10.0).await;

    let (status, body) = app
        .put(
            &format!("/createReplaceTransaction/{id}"),
            json!({
                "reason": "defective",
                "items": [{ "product_id": "P1", "quantity": 1 }],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["replaceId"], "RP-00001");
    assert_eq!(body["replace"]["items"][0]["transactionItemId"], "TI-00001");
    assert_eq!(body["replace"]["items"][0]["productName"], "Pen");
    assert_eq!(app.stock("P1").await, 8);

    let (status, body) = app.get(&format!("/getReplace/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["reason"], "defective");
    assert_eq!(body[0]["items"][0]["replacedItemId"], "RPI-00001");

    let (status, _) = app
        .put(
            &format!("/createReplaceTransaction/{id}"),
            json!({ "items": [{ "transactionItemId": "TI-09999", "product_id": "P1", "quantity": 1 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
