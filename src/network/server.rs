use crate::core::{Blockchain, Token, Transaction, TransactionRequest};
use crate::network::ChainPayload;
use actix_web::{delete, get, post, put, web, App, HttpResponse, HttpServer, Responder};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Serialize)]
struct StatusResponse {
    message: &'static str,
}

const SUCCESS: StatusResponse = StatusResponse { message: "success" };
const FAIL: StatusResponse = StatusResponse { message: "fail" };

#[derive(Serialize)]
struct PoolResponse {
    transactions: Vec<Transaction>,
    length: usize,
}

#[derive(Serialize)]
struct AllAmountsResponse {
    amount: Vec<Token>,
}

#[derive(Deserialize)]
pub struct BalanceQuery {
    pub blockchain_address: String,
    pub token_name: Option<String>,
}

#[derive(Deserialize)]
pub struct AddressQuery {
    pub blockchain_address: String,
}

#[get("/")]
pub async fn index(ledger: web::Data<Blockchain>) -> impl Responder {
    HttpResponse::Ok().json(ChainPayload {
        chain: ledger.chain(),
    })
}

#[get("/chain")]
pub async fn get_chain(ledger: web::Data<Blockchain>) -> impl Responder {
    HttpResponse::Ok().json(ChainPayload {
        chain: ledger.chain(),
    })
}

#[get("/transactions")]
pub async fn get_transactions(ledger: web::Data<Blockchain>) -> impl Responder {
    let transactions = ledger.copy_transaction_pool();
    HttpResponse::Ok().json(PoolResponse {
        length: transactions.len(),
        transactions,
    })
}

/// Admits a wallet-submitted transaction and forwards it to peers.
#[post("/transactions")]
pub async fn create_transaction(
    ledger: web::Data<Blockchain>,
    request: web::Json<TransactionRequest>,
) -> impl Responder {
    let request = request.into_inner();
    match web::block(move || ledger.create_transaction_request(&request)).await {
        Ok(true) => HttpResponse::Created().json(SUCCESS),
        Ok(false) => HttpResponse::BadRequest().json(FAIL),
        Err(e) => {
            warn!("Transaction admission aborted: {e}");
            HttpResponse::InternalServerError().json(FAIL)
        }
    }
}

/// Admits a transaction forwarded by a peer, without forwarding it again.
#[put("/transactions")]
pub async fn add_transaction(
    ledger: web::Data<Blockchain>,
    request: web::Json<TransactionRequest>,
) -> impl Responder {
    let request = request.into_inner();
    match web::block(move || ledger.add_transaction_request(&request)).await {
        Ok(true) => HttpResponse::Ok().json(SUCCESS),
        Ok(false) => HttpResponse::BadRequest().json(FAIL),
        Err(e) => {
            warn!("Transaction admission aborted: {e}");
            HttpResponse::InternalServerError().json(FAIL)
        }
    }
}

#[delete("/transactions")]
pub async fn clear_transactions(ledger: web::Data<Blockchain>) -> impl Responder {
    match web::block(move || ledger.clear_transaction_pool()).await {
        Ok(()) => HttpResponse::Ok().json(SUCCESS),
        Err(_) => HttpResponse::InternalServerError().json(FAIL),
    }
}

#[get("/mine")]
pub async fn mine(ledger: web::Data<Blockchain>) -> impl Responder {
    match web::block(move || ledger.mining()).await {
        Ok(true) => HttpResponse::Ok().json(SUCCESS),
        _ => HttpResponse::InternalServerError().json(FAIL),
    }
}

#[put("/consensus")]
pub async fn consensus(ledger: web::Data<Blockchain>) -> impl Responder {
    match web::block(move || ledger.resolve_conflicts()).await {
        Ok(true) => HttpResponse::Ok().json(SUCCESS),
        Ok(false) => HttpResponse::Ok().json(FAIL),
        Err(_) => HttpResponse::InternalServerError().json(FAIL),
    }
}

/// Starts the periodic mining loop if it is not already running.
#[get("/mine/start")]
pub async fn start_mining(ledger: web::Data<Blockchain>) -> impl Responder {
    match ledger.into_inner().start_mining() {
        Ok(started) => {
            if !started {
                info!("Mining loop already running");
            }
            HttpResponse::Ok().json(SUCCESS)
        }
        Err(e) => {
            warn!("Failed to start mining loop: {e}");
            HttpResponse::InternalServerError().json(FAIL)
        }
    }
}

/// Balance of one token; defaults to the reward token.
#[get("/balance")]
pub async fn balance(
    ledger: web::Data<Blockchain>,
    query: web::Query<BalanceQuery>,
) -> impl Responder {
    let query = query.into_inner();
    let token_name = query
        .token_name
        .unwrap_or_else(|| ledger.get_config().reward_token.clone());
    let result = web::block(move || {
        let amount = ledger.calculate_total_amount(&query.blockchain_address, &token_name);
        Token::new(&token_name, amount)
    })
    .await;
    match result {
        Ok(token) => HttpResponse::Ok().json(token),
        Err(_) => HttpResponse::InternalServerError().json(FAIL),
    }
}

#[get("/balance_all")]
pub async fn balance_all(
    ledger: web::Data<Blockchain>,
    query: web::Query<AddressQuery>,
) -> impl Responder {
    let address = query.into_inner().blockchain_address;
    match web::block(move || ledger.calculate_all_amounts(&address)).await {
        Ok(amount) => HttpResponse::Ok().json(AllAmountsResponse { amount }),
        Err(_) => HttpResponse::InternalServerError().json(FAIL),
    }
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(index)
        .service(get_chain)
        .service(get_transactions)
        .service(create_transaction)
        .service(add_transaction)
        .service(clear_transactions)
        .service(mine)
        .service(start_mining)
        .service(consensus)
        .service(balance)
        .service(balance_all);
}

/// Serves the node API until the server is stopped.
pub async fn run_server(ledger: Arc<Blockchain>, port: u16) -> std::io::Result<()> {
    let state = web::Data::from(ledger);
    info!("Node API listening on 0.0.0.0:{port}");
    HttpServer::new(move || App::new().app_data(state.clone()).configure(init_routes))
        .bind(("0.0.0.0", port))?
        .run()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testnet::{create_test_blockchain, dnz};
    use crate::wallet::Wallet;
    use actix_web::{http::StatusCode, test};

    #[actix_web::test]
    async fn test_chain_returns_genesis() {
        let (blockchain, _client, _dir) = create_test_blockchain(1).unwrap();
        let state = web::Data::new(blockchain);
        let app = test::init_service(App::new().app_data(state.clone()).configure(init_routes)).await;

        let req = test::TestRequest::get().uri("/chain").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["chain"].as_array().unwrap().len(), 1);
    }

    #[actix_web::test]
    async fn test_mine_start_launches_loop_once() {
        let (blockchain, _client, _dir) = create_test_blockchain(1).unwrap();
        let state = web::Data::new(blockchain);
        let app = test::init_service(App::new().app_data(state.clone()).configure(init_routes)).await;

        for _ in 0..2 {
            let req = test::TestRequest::get().uri("/mine/start").to_request();
            let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body["message"], "success");
        }
        assert!(state.is_mining());

        state.stop_mining();
        assert_eq!(state.len(), 2);
    }

    #[actix_web::test]
    async fn test_balance_all_lists_tokens() {
        let (blockchain, _client, _dir) = create_test_blockchain(1).unwrap();
        blockchain.add_transaction("DENIZ", "A", dnz("4"), None, None);
        blockchain.create_block(0, blockchain.last_block().hash()).unwrap();
        let state = web::Data::new(blockchain);
        let app = test::init_service(App::new().app_data(state.clone()).configure(init_routes)).await;

        let req = test::TestRequest::get()
            .uri("/balance_all?blockchain_address=A")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["amount"][0]["token_name"], "DNZ");
        assert_eq!(body["amount"][0]["token_value"], "4");
    }

    #[actix_web::test]
    async fn test_unfunded_transaction_is_bad_request() {
        let (blockchain, _client, _dir) = create_test_blockchain(1).unwrap();
        let state = web::Data::new(blockchain);
        let app = test::init_service(App::new().app_data(state.clone()).configure(init_routes)).await;

        let request = Wallet::new().unwrap().sign_transaction("B", dnz("3")).unwrap();
        let req = test::TestRequest::post()
            .uri("/transactions")
            .set_json(&request)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_mine_then_balance_and_clear() {
        let (blockchain, _client, _dir) = create_test_blockchain(1).unwrap();
        let state = web::Data::new(blockchain);
        let app = test::init_service(App::new().app_data(state.clone()).configure(init_routes)).await;

        let req = test::TestRequest::get().uri("/mine").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["message"], "success");

        let req = test::TestRequest::get()
            .uri("/balance?blockchain_address=MINER&token_name=DNZ")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["token_name"], "DNZ");
        assert_eq!(body["token_value"], "1");

        state.add_transaction("DENIZ", "A", dnz("2"), None, None);
        let req = test::TestRequest::delete().uri("/transactions").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(state.copy_transaction_pool().is_empty());
    }
}
