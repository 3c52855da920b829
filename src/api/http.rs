//! HTTP implementation of the backend collaborator.

use super::{
    PromotionsApi,
    wire::{
        BalanceLookupRequest, BalanceLookupResponse, CampaignRecord, ClientLookupResponse,
        ListResponse, PaymentMethodRecord,
    },
    ApprovalRequest, OnlineSubmission, RejectionRequest,
};
use crate::{
    config::ApiConfig,
    entities::{
        Campaign, Client, CouponPrintJob, CustomerBalance, PaymentMethod, PendingBatch,
        batch::BatchSubmission, coupon_job::CouponsToPrint,
    },
    errors::{Error, Result},
};
use async_trait::async_trait;
use reqwest::{Client as HttpClient, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument};

/// Which failure kind a call reports when the transport or the server fails.
#[derive(Debug, Clone, Copy)]
enum CallKind {
    Lookup,
    Submission,
}

impl CallKind {
    fn failure(self, message: String) -> Error {
        match self {
            Self::Lookup => Error::LookupFailure { message },
            Self::Submission => Error::SubmissionFailure { message },
        }
    }
}

/// Backend client over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: HttpClient,
    config: ApiConfig,
}

impl HttpApi {
    /// Builds the HTTP client with the configured timeout.
    ///
    /// # Errors
    /// Returns `Error::Config` if the TLS backend cannot be initialised.
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = HttpClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config {
                message: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client, config })
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<R>(&self, builder: RequestBuilder, endpoint: &str, kind: CallKind) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| kind.failure(format!("{endpoint}: {e}")))?;
        let response = Self::check_status(response, endpoint, kind).await?;
        response
            .json::<R>()
            .await
            .map_err(|e| kind.failure(format!("{endpoint} returned an unexpected body: {e}")))
    }

    async fn check_status(response: Response, endpoint: &str, kind: CallKind) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        error!("{} answered {}: {}", endpoint, status, body);
        Err(kind.failure(format!("{endpoint} answered {status}")))
    }

    async fn get<R>(&self, endpoint: &str, kind: CallKind) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let builder = self.client.get(self.config.url(endpoint));
        self.send(builder, endpoint, kind).await
    }

    async fn post<T, R>(&self, endpoint: &str, body: &T, kind: CallKind) -> Result<R>
    where
        T: serde::Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let builder = self.client.post(self.config.url(endpoint)).json(body);
        self.send(builder, endpoint, kind).await
    }

    async fn put<T, R>(&self, endpoint: &str, body: &T, kind: CallKind) -> Result<R>
    where
        T: serde::Serialize + Sync + ?Sized,
        R: DeserializeOwned,
    {
        let builder = self.client.put(self.config.url(endpoint)).json(body);
        self.send(builder, endpoint, kind).await
    }
}

#[async_trait]
impl PromotionsApi for HttpApi {
    #[instrument(skip(self))]
    async fn find_client_by_ruc(&self, ruc: &str) -> Result<Option<Client>> {
        let builder = self
            .client
            .get(self.config.url("/api/clientes/obtenerCliente"))
            .query(&[("ruc", ruc)]);
        let response: ClientLookupResponse = self
            .send(builder, "/api/clientes/obtenerCliente", CallKind::Lookup)
            .await?;
        response.into_client().map_err(|e| Error::LookupFailure {
            message: format!("client record has an unexpected shape: {e}"),
        })
    }

    #[instrument(skip(self))]
    async fn active_campaigns(&self) -> Result<Vec<Campaign>> {
        let response: ListResponse<CampaignRecord> =
            self.get("/api/campanias?activo=1", CallKind::Lookup).await?;
        let campaigns: Vec<Campaign> = response
            .data
            .into_iter()
            .filter_map(CampaignRecord::into_campaign)
            .collect();
        debug!("Loaded {} active campaigns", campaigns.len());
        Ok(campaigns)
    }

    #[instrument(skip(self))]
    async fn active_payment_methods(&self) -> Result<Vec<PaymentMethod>> {
        let response: ListResponse<PaymentMethodRecord> =
            self.get("/api/formasPago?activo=1", CallKind::Lookup).await?;
        Ok(response
            .data
            .into_iter()
            .map(PaymentMethodRecord::into_payment_method)
            .collect())
    }

    #[instrument(skip(self))]
    async fn client_balances(&self, cliente_id: i64) -> Result<Vec<CustomerBalance>> {
        let response: BalanceLookupResponse = self
            .post(
                "/api/saldosCliente",
                &BalanceLookupRequest { cliente_id },
                CallKind::Lookup,
            )
            .await?;
        debug!("Client {} carries {} balances", cliente_id, response.data.len());
        Ok(response.data)
    }

    #[instrument(skip(self, batch), fields(cliente_id = batch.cliente_id))]
    async fn submit_batch(&self, batch: &PendingBatch) -> Result<Vec<CouponPrintJob>> {
        let response: CouponsToPrint = self
            .post(
                "/api/facturas/facturasIsla",
                &BatchSubmission {
                    facturas_cliente: batch,
                },
                CallKind::Submission,
            )
            .await?;
        Ok(response.cupones_imprimir)
    }

    #[instrument(skip(self, submission), fields(cliente_id = submission.facturas_cliente.cliente_id))]
    async fn submit_online_invoice(&self, submission: &OnlineSubmission) -> Result<Vec<CouponPrintJob>> {
        let response: CouponsToPrint = self
            .post("/api/facturas/facturasWeb", submission, CallKind::Submission)
            .await?;
        Ok(response.cupones_imprimir)
    }

    #[instrument(skip(self, request), fields(factura_id = request.factura_id))]
    async fn approve_invoice(&self, request: &ApprovalRequest) -> Result<Vec<CouponPrintJob>> {
        let response: CouponsToPrint = self
            .put("/api/facturas/procesarFacturaWeb", request, CallKind::Submission)
            .await?;
        Ok(response.cupones_imprimir)
    }

    #[instrument(skip(self, request), fields(factura_id = request.factura_id))]
    async fn reject_invoice(&self, request: &RejectionRequest) -> Result<()> {
        let endpoint = "/api/facturas/rechazarFacturaWeb";
        let response = self
            .authorized(self.client.put(self.config.url(endpoint)).json(request))
            .send()
            .await
            .map_err(|e| CallKind::Submission.failure(format!("{endpoint}: {e}")))?;
        Self::check_status(response, endpoint, CallKind::Submission).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use rust_decimal_macros::dec;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api_for(server: &MockServer) -> HttpApi {
        HttpApi::new(ApiConfig {
            base_url: server.uri(),
            token: Some("tok".to_string()),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_client_balances_posts_client_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/saldosCliente"))
            .and(header("authorization", "Bearer tok"))
            .and(body_json(serde_json::json!({ "cliente_id": 5 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "campania_id": 1, "promocion_id": 2, "saldo": "8.00" }]
            })))
            .mount(&server)
            .await;

        let balances = api_for(&server).client_balances(5).await.unwrap();
        assert_eq!(balances.len(), 1);
        assert_eq!(balances[0].saldo, dec!(8));
    }

    #[tokio::test]
    async fn test_balance_server_error_is_lookup_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/saldosCliente"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = api_for(&server).client_balances(5).await;
        assert!(matches!(result, Err(Error::LookupFailure { .. })));
    }

    #[tokio::test]
    async fn test_malformed_balance_body_is_lookup_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/saldosCliente"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>mantenimiento</html>"))
            .mount(&server)
            .await;

        let result = api_for(&server).client_balances(5).await;
        assert!(matches!(result, Err(Error::LookupFailure { .. })));
    }

    #[tokio::test]
    async fn test_submit_batch_returns_print_jobs() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/facturas/facturasIsla"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "cuponesImprimir": [
                    { "campania": "Navidad", "ultimoCuponImpreso": 100, "ultimoCuponImprimir": 103 }
                ]
            })))
            .mount(&server)
            .await;

        let batch = PendingBatch::new(5, 8, "1712345678".to_string());
        let jobs = api_for(&server).submit_batch(&batch).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].ultimo_cupon_imprimir, 103);
    }

    #[tokio::test]
    async fn test_rejected_submission_is_submission_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/facturas/facturasIsla"))
            .respond_with(ResponseTemplate::new(400).set_body_string("factura duplicada"))
            .mount(&server)
            .await;

        let batch = PendingBatch::new(5, 8, "1712345678".to_string());
        let result = api_for(&server).submit_batch(&batch).await;
        assert!(matches!(result, Err(Error::SubmissionFailure { .. })));
    }

    #[tokio::test]
    async fn test_find_client_by_ruc() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/clientes/obtenerCliente"))
            .and(query_param("ruc", "1712345678"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "clienteExistente": { "id": 5, "nombre": "Ana", "apellidos": "Paredes", "ruc": "1712345678" }
            })))
            .mount(&server)
            .await;

        let client = api_for(&server)
            .find_client_by_ruc("1712345678")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(client.full_name(), "Ana Paredes");
    }

    #[tokio::test]
    async fn test_reject_invoice_ignores_response_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/facturas/rechazarFacturaWeb"))
            .and(body_json(serde_json::json!({
                "factura_id": 12, "observacion": "Ilegible", "usuario_id": 9
            })))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let request = RejectionRequest {
            factura_id: 12,
            observacion: "Ilegible".to_string(),
            usuario_id: 9,
        };
        api_for(&server).reject_invoice(&request).await.unwrap();
    }
}
