//! Client for communicating with the backend.

use crate::{
    config::ApiConfig,
    context::credentials::CredentialProvider,
    error::{WebError, WebResult, REQUEST_FAILED, UNKNOWN_ERROR},
    transport::{HttpRequest, Method, Transport},
};
use bistro_api::{request as req, response as res};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::rc::Rc;
use url::Url;

const NO_BODY: Option<&()> = None;

/// Whether a request carries a bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    None,
    /// Attach a token when one is available, send the request either way.
    Optional,
    /// Fail with [`WebError::AuthUnavailable`] without sending when there is no token.
    Required,
}

#[derive(Clone)]
pub struct Client {
    config: ApiConfig,
    transport: Rc<dyn Transport>,
    credentials: Rc<dyn CredentialProvider>,
}

/// Non-API methods
impl Client {
    pub fn new(
        config: ApiConfig,
        transport: Rc<dyn Transport>,
        credentials: Rc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            config,
            transport,
            credentials,
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Sends a request and returns the parsed JSON body of a success response.
    ///
    /// This is the only place transport and HTTP outcomes are turned into [`WebError`]s.
    pub async fn execute<B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        headers: &[(&str, &str)],
        auth: Auth,
    ) -> WebResult<Value>
    where
        B: Serialize + ?Sized,
    {
        let body = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(|err| WebError::invalid(format!("Failed to encode request body: {err}")))?;

        // fetched right before sending, tokens rotate
        let token = match auth {
            Auth::None => None,
            Auth::Optional => self.bearer_token().await.ok(),
            Auth::Required => Some(self.bearer_token().await?),
        };

        let mut request_headers = vec![(
            "Content-Type".to_string(),
            "application/json".to_string(),
        )];
        for (name, value) in headers {
            set_header(&mut request_headers, name, value);
        }
        if let Some(token) = &token {
            if headers
                .iter()
                .any(|(name, _)| name.eq_ignore_ascii_case("Authorization"))
            {
                tracing::warn!("Replacing caller-supplied Authorization header for {url}");
            }
            set_header(&mut request_headers, "Authorization", &format!("Bearer {token}"));
        }

        tracing::debug!(
            %method,
            %url,
            authenticated = token.is_some(),
            "Sending request"
        );
        let request = HttpRequest {
            method,
            url: url.to_string(),
            headers: request_headers,
            body,
        };
        let res = self.transport.send(request).await.map_err(|err| {
            tracing::warn!("{method} {url} failed without a response: {err}");
            WebError::Network(err.to_string())
        })?;

        if !res.is_success() {
            let message = error_message(&res.body);
            if res.status == 401 {
                tracing::warn!("Server unexpectedly returned 401 for {url}");
            }
            tracing::warn!("{method} {url} returned HTTP {}: {message}", res.status);
            return Err(WebError::Api {
                status: res.status,
                message,
            });
        }
        parse_body(&res.body)
    }

    /// [`Client::execute`] followed by decoding into `T`.
    pub async fn fetch<T, B>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        auth: Auth,
    ) -> WebResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let value = self.execute(method, url, body, &[], auth).await?;
        let decoded = serde_json::from_value(value)?;
        Ok(decoded)
    }

    async fn bearer_token(&self) -> WebResult<String> {
        match self.credentials.token().await {
            Ok(Some(token)) if !token.is_empty() => Ok(token),
            Ok(_) => {
                tracing::info!("No token available");
                Err(WebError::AuthUnavailable)
            }
            Err(err) => {
                tracing::warn!("Failed to get a token: {err}");
                Err(WebError::AuthUnavailable)
            }
        }
    }
}

/// API methods
impl Client {
    pub async fn current_user(&self) -> WebResult<res::CurrentUser> {
        tracing::info!("Fetching current user");

        let url = self.config.endpoint(&["auth", "me"])?;
        let user: res::CurrentUser = self.fetch(Method::Get, url, NO_BODY, Auth::Required).await?;

        tracing::info!("Current user: {}", user.user.id);
        Ok(user)
    }

    pub async fn verify_token(&self) -> WebResult<res::TokenCheck> {
        tracing::info!("Verifying token");

        let url = self.config.endpoint(&["auth", "verify"])?;
        self.fetch(Method::Get, url, NO_BODY, Auth::Required).await
    }

    /// Asks the backend whether it accepts our credentials. Never fails for lack of a token.
    pub async fn check_auth(&self) -> WebResult<res::AuthStatus> {
        tracing::info!("Checking authentication status");

        let url = self.config.endpoint(&["auth", "check"])?;
        self.fetch(Method::Get, url, NO_BODY, Auth::Optional).await
    }

    /// Lists menu items, optionally limited to one category. An empty category means all.
    pub async fn list_menu_items(&self, category: Option<&str>) -> WebResult<Vec<res::MenuItem>> {
        let query = category
            .map(req::MenuItemQuery::category)
            .unwrap_or_default();
        self.list_menu_items_filtered(&query).await
    }

    pub async fn list_menu_items_filtered(
        &self,
        query: &req::MenuItemQuery<'_>,
    ) -> WebResult<Vec<res::MenuItem>> {
        tracing::info!("Fetching menu items {query:?}");

        let url = self
            .config
            .endpoint_with_query(&["menu", "items"], &query.query_pairs())?;
        let items: Vec<res::MenuItem> =
            self.fetch(Method::Get, url, NO_BODY, Auth::None).await?;

        tracing::info!("Fetched {} menu items", items.len());
        Ok(items)
    }

    pub async fn get_menu_item(&self, id: &str) -> WebResult<res::MenuItem> {
        let id = path_id("menu item", id)?;
        tracing::info!("Fetching menu item {id}");

        let url = self.config.endpoint(&["menu", "items", id])?;
        let item = self.fetch(Method::Get, url, NO_BODY, Auth::None).await?;

        tracing::info!("Fetched menu item {id}");
        Ok(item)
    }

    pub async fn list_categories(&self) -> WebResult<Vec<res::MenuCategory>> {
        tracing::info!("Fetching menu categories");

        let url = self.config.endpoint(&["menu", "categories"])?;
        let categories: Vec<res::MenuCategory> =
            self.fetch(Method::Get, url, NO_BODY, Auth::None).await?;

        tracing::info!("Fetched {} menu categories", categories.len());
        Ok(categories)
    }

    pub async fn list_my_orders(&self) -> WebResult<Vec<res::Order>> {
        tracing::info!("Fetching orders");

        let url = self.config.endpoint(&["orders"])?;
        let orders: Vec<res::Order> = self.fetch(Method::Get, url, NO_BODY, Auth::Required).await?;

        tracing::info!("Fetched {} orders", orders.len());
        Ok(orders)
    }

    pub async fn get_order(&self, id: &str) -> WebResult<res::Order> {
        let id = path_id("order", id)?;
        tracing::info!("Fetching order {id}");

        let url = self.config.endpoint(&["orders", id])?;
        let order = self.fetch(Method::Get, url, NO_BODY, Auth::Required).await?;

        tracing::info!("Fetched order {id}");
        Ok(order)
    }

    /// Places an order. Totals and status come from the backend.
    pub async fn create_order(&self, order: &req::NewOrder<'_>) -> WebResult<res::Order> {
        tracing::info!("Creating order with {} items", order.items.len());

        order.validate().map_err(WebError::Invalid)?;
        let url = self.config.endpoint(&["orders"])?;
        let created: res::Order = self
            .fetch(Method::Post, url, Some(order), Auth::Required)
            .await?;

        tracing::info!("Created order {}", created.id);
        Ok(created)
    }

    pub async fn cancel_order(&self, id: &str) -> WebResult<res::Message> {
        let id = path_id("order", id)?;
        tracing::info!("Cancelling order {id}");

        let url = self.config.endpoint(&["orders", id, "cancel"])?;
        let message = self
            .fetch(Method::Post, url, NO_BODY, Auth::Required)
            .await?;

        tracing::info!("Cancelled order {id}");
        Ok(message)
    }

    /// Role checks happen on the backend.
    pub async fn create_menu_item(&self, item: &req::MenuItemInput<'_>) -> WebResult<res::MenuItem> {
        tracing::info!("Creating menu item {}", item.name);

        item.validate().map_err(WebError::Invalid)?;
        let url = self.config.endpoint(&["menu", "items"])?;
        let created: res::MenuItem = self
            .fetch(Method::Post, url, Some(item), Auth::Required)
            .await?;

        tracing::info!("Created menu item {}", created.id);
        Ok(created)
    }

    pub async fn update_menu_item(
        &self,
        id: &str,
        item: &req::MenuItemInput<'_>,
    ) -> WebResult<res::MenuItem> {
        let id = path_id("menu item", id)?;
        tracing::info!("Updating menu item {id}");

        item.validate().map_err(WebError::Invalid)?;
        let url = self.config.endpoint(&["menu", "items", id])?;
        let updated = self
            .fetch(Method::Put, url, Some(item), Auth::Required)
            .await?;

        tracing::info!("Updated menu item {id}");
        Ok(updated)
    }

    pub async fn delete_menu_item(&self, id: &str) -> WebResult<res::Message> {
        let id = path_id("menu item", id)?;
        tracing::info!("Deleting menu item {id}");

        let url = self.config.endpoint(&["menu", "items", id])?;
        let message = self
            .fetch(Method::Delete, url, NO_BODY, Auth::Required)
            .await?;

        tracing::info!("Deleted menu item {id}");
        Ok(message)
    }
}

fn path_id<'a>(what: &str, id: &'a str) -> WebResult<&'a str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(WebError::invalid(format!("Missing {what} id")));
    }
    Ok(id)
}

/// Replaces a header with the same name (case-insensitively) or appends a new one.
fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    match headers
        .iter_mut()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
    {
        Some((_, existing)) => *existing = value.to_string(),
        None => headers.push((name.to_string(), value.to_string())),
    }
}

fn error_message(body: &[u8]) -> String {
    if let Ok(res::Error { detail }) = serde_json::from_slice(body) {
        if !detail.is_empty() {
            return detail;
        }
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(_) => REQUEST_FAILED.to_string(),
        Err(_) => UNKNOWN_ERROR.to_string(),
    }
}

fn parse_body(body: &[u8]) -> WebResult<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    let value = serde_json::from_slice(body)?;
    Ok(value)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        error::ErrorKind,
        testing::{self, FakeCredentials, FakeTransport},
        utils::format_price,
    };
    use bistro_api::response::OrderStatus;
    use futures::executor::block_on;
    use serde_json::json;

    fn setup(credentials: FakeCredentials) -> (Client, Rc<FakeTransport>, Rc<FakeCredentials>) {
        let transport = Rc::new(FakeTransport::default());
        let credentials = Rc::new(credentials);
        let client = testing::client(&transport, &credentials);
        (client, transport, credentials)
    }

    fn order_json(id: &str, status: &str) -> Value {
        json!({
            "id": id,
            "user_id": "user_1",
            "items": [{"menu_item_id": "1", "quantity": 2}],
            "total": 20.0,
            "status": status,
            "created_at": "2024-05-01T12:00:00",
            "updated_at": "2024-05-01T12:00:00",
            "is_takeaway": false
        })
    }

    fn new_order() -> req::NewOrder<'static> {
        req::NewOrder {
            items: vec![req::NewOrderItem {
                menu_item_id: "1".into(),
                quantity: 2,
                notes: None,
            }],
            delivery_address: None,
            is_takeaway: false,
            notes: None,
        }
    }

    fn menu_input() -> req::MenuItemInput<'static> {
        req::MenuItemInput {
            name: "Soup".into(),
            description: "Of the day".into(),
            price: 4.5,
            category: "starter".into(),
            available: true,
            image_url: None,
        }
    }

    #[test]
    fn lists_public_menu_without_token() {
        let (client, transport, credentials) = setup(FakeCredentials::signed_in("user_1"));
        transport.respond_json(
            200,
            json!([{"id": "1", "name": "Soup", "price": 4.5, "category": "starter", "available": true}]),
        );

        let items = block_on(client.list_menu_items(None)).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Soup");
        assert_eq!(format_price(items[0].price), "$4.50");
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Get);
        assert_eq!(requests[0].url, "http://localhost:5001/api/v1/menu/items");
        assert_eq!(requests[0].header("content-type"), Some("application/json"));
        assert_eq!(requests[0].header("Authorization"), None);
        assert_eq!(credentials.token_calls(), 0);
    }

    #[test]
    fn passes_category_filter() {
        let (client, transport, _) = setup(FakeCredentials::signed_out());
        transport.respond_json(200, json!([]));

        block_on(client.list_menu_items(Some("pizza"))).unwrap();

        assert_eq!(
            transport.requests()[0].url,
            "http://localhost:5001/api/v1/menu/items?category=pizza"
        );
    }

    #[test]
    fn returns_success_json_unchanged() {
        let (client, transport, _) = setup(FakeCredentials::signed_out());
        let payload = json!({"nested": {"list": [1, 2.5, null, "x"]}, "flag": false});
        transport.respond_json(200, payload.clone());

        let url = client.config().endpoint(&["anything"]).unwrap();
        let value = block_on(client.execute(Method::Get, url, NO_BODY, &[], Auth::None)).unwrap();

        assert_eq!(value, payload);
    }

    #[test]
    fn empty_success_body_is_null() {
        let (client, transport, _) = setup(FakeCredentials::signed_out());
        transport.respond_raw(204, "");

        let url = client.config().endpoint(&["anything"]).unwrap();
        let value = block_on(client.execute(Method::Delete, url, NO_BODY, &[], Auth::None)).unwrap();

        assert_eq!(value, Value::Null);
    }

    #[test]
    fn create_order_signed_out_sends_nothing() {
        let (client, transport, _) = setup(FakeCredentials::signed_out());

        let err = block_on(client.create_order(&new_order())).unwrap_err();

        assert_eq!(err, WebError::AuthUnavailable);
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn auth_required_operations_need_a_token() {
        let (client, transport, credentials) = setup(FakeCredentials::signed_out());
        let input = menu_input();
        let order = new_order();

        let errors = block_on(async {
            vec![
                client.current_user().await.map(drop),
                client.verify_token().await.map(drop),
                client.list_my_orders().await.map(drop),
                client.get_order("1").await.map(drop),
                client.create_order(&order).await.map(drop),
                client.cancel_order("1").await.map(drop),
                client.create_menu_item(&input).await.map(drop),
                client.update_menu_item("1", &input).await.map(drop),
                client.delete_menu_item("1").await.map(drop),
            ]
        });

        for result in errors {
            assert_eq!(result.unwrap_err(), WebError::AuthUnavailable);
        }
        assert!(transport.requests().is_empty());
        assert_eq!(credentials.token_calls(), 9);
    }

    #[test]
    fn empty_or_failed_tokens_are_unavailable() {
        let (client, transport, credentials) = setup(FakeCredentials::signed_in("user_1"));
        credentials.push_token(Ok(Some(String::new())));
        credentials.push_token(Err("provider crashed".to_string()));

        let first = block_on(client.list_my_orders()).unwrap_err();
        let second = block_on(client.list_my_orders()).unwrap_err();

        assert_eq!(first.kind(), ErrorKind::AuthUnavailable);
        assert_eq!(second.kind(), ErrorKind::AuthUnavailable);
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn fetches_a_fresh_token_for_every_call() {
        let (client, transport, credentials) = setup(FakeCredentials::signed_in("user_1"));
        transport.respond_json(200, json!([]));
        transport.respond_json(200, json!([order_json("1", "pending")]));

        block_on(client.list_my_orders()).unwrap();
        let orders = block_on(client.list_my_orders()).unwrap();

        assert_eq!(orders[0].status, OrderStatus::Pending);
        assert_eq!(credentials.token_calls(), 2);
        let requests = transport.requests();
        assert_eq!(requests[0].header("Authorization"), Some("Bearer token-1"));
        assert_eq!(requests[1].header("Authorization"), Some("Bearer token-2"));
    }

    #[test]
    fn error_detail_becomes_api_error() {
        let (client, transport, _) = setup(FakeCredentials::signed_in("user_1"));
        transport.respond_json(401, json!({"detail": "expired token"}));

        let err = block_on(client.list_my_orders()).unwrap_err();

        assert_eq!(err, WebError::api(401, "expired token"));
    }

    #[test]
    fn unreadable_error_body_is_unknown_error() {
        let (client, transport, _) = setup(FakeCredentials::signed_out());
        transport.respond_raw(502, "<html>Bad Gateway</html>");
        transport.respond_json(500, json!({"error": "boom"}));
        transport.respond_raw(404, "");

        let first = block_on(client.list_categories()).unwrap_err();
        let second = block_on(client.list_categories()).unwrap_err();
        let third = block_on(client.get_menu_item("9")).unwrap_err();

        assert_eq!(first, WebError::api(502, UNKNOWN_ERROR));
        assert_eq!(second, WebError::api(500, REQUEST_FAILED));
        assert_eq!(third, WebError::api(404, UNKNOWN_ERROR));
    }

    #[test]
    fn network_failure_is_not_an_api_error() {
        let (client, transport, _) = setup(FakeCredentials::signed_in("user_1"));
        transport.fail("TypeError: Failed to fetch");

        let err = block_on(client.cancel_order("X")).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(!matches!(err, WebError::Api { .. }));
        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[0].url, "http://localhost:5001/api/v1/orders/X/cancel");
    }

    #[test]
    fn wrong_shape_is_a_decode_error() {
        let (client, transport, _) = setup(FakeCredentials::signed_out());
        transport.respond_json(200, json!({"items": []}));
        transport.respond_raw(200, "not json");

        let first = block_on(client.list_menu_items(None)).unwrap_err();
        let second = block_on(client.list_categories()).unwrap_err();

        assert_eq!(first.kind(), ErrorKind::Decode);
        assert_eq!(second.kind(), ErrorKind::Decode);
    }

    #[test]
    fn creates_order_with_json_body() {
        let (client, transport, _) = setup(FakeCredentials::signed_in("user_1"));
        transport.respond_json(200, order_json("42", "pending"));

        let order = block_on(client.create_order(&new_order())).unwrap();

        assert_eq!(order.id, "42");
        let request = &transport.requests()[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, "http://localhost:5001/api/v1/orders");
        let body: Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({"items": [{"menu_item_id": "1", "quantity": 2}], "is_takeaway": false})
        );
    }

    #[test]
    fn invalid_input_is_rejected_locally() {
        let (client, transport, credentials) = setup(FakeCredentials::signed_in("user_1"));
        let mut order = new_order();
        order.items[0].quantity = 0;
        let mut input = menu_input();
        input.name = "".into();

        let errors = block_on(async {
            vec![
                client.create_order(&order).await.map(drop),
                client.create_menu_item(&input).await.map(drop),
                client.get_menu_item("").await.map(drop),
                client.get_order("  ").await.map(drop),
                client.delete_menu_item("").await.map(drop),
            ]
        });

        for result in errors {
            assert_eq!(result.unwrap_err().kind(), ErrorKind::Invalid);
        }
        assert!(transport.requests().is_empty());
        assert_eq!(credentials.token_calls(), 0);
    }

    #[test]
    fn optional_auth_proceeds_without_token() {
        let (client, transport, _) = setup(FakeCredentials::signed_out());
        transport.respond_json(200, json!({"authenticated": false}));

        let status = block_on(client.check_auth()).unwrap();

        assert!(!status.authenticated);
        assert_eq!(transport.requests()[0].header("Authorization"), None);
    }

    #[test]
    fn optional_auth_attaches_available_token() {
        let (client, transport, credentials) = setup(FakeCredentials::signed_in("user_1"));
        transport.respond_json(200, json!({"authenticated": true, "user_id": "user_1"}));

        let status = block_on(client.check_auth()).unwrap();

        assert!(status.authenticated);
        assert_eq!(status.user_id.as_deref(), Some("user_1"));
        assert_eq!(
            transport.requests()[0].header("Authorization"),
            Some("Bearer token-1")
        );
        assert_eq!(credentials.token_calls(), 1);
    }

    #[test]
    fn non_string_detail_is_request_failed() {
        let (client, transport, _) = setup(FakeCredentials::signed_out());
        transport.respond_json(422, json!({"detail": [{"loc": ["body"], "msg": "field required"}]}));
        transport.respond_json(400, json!({"detail": ""}));

        let first = block_on(client.list_categories()).unwrap_err();
        let second = block_on(client.list_categories()).unwrap_err();

        assert_eq!(first, WebError::api(422, REQUEST_FAILED));
        assert_eq!(second, WebError::api(400, REQUEST_FAILED));
    }

    #[test]
    fn merges_caller_headers() {
        let (client, transport, _) = setup(FakeCredentials::signed_in("user_1"));
        transport.respond_json(200, json!(null));

        let url = client.config().endpoint(&["orders"]).unwrap();
        let headers = [
            ("X-Request-Id", "abc"),
            ("authorization", "Bearer stale"),
            ("content-type", "application/json; charset=utf-8"),
        ];
        block_on(client.execute(Method::Get, url, NO_BODY, &headers, Auth::Required)).unwrap();

        let request = &transport.requests()[0];
        assert_eq!(request.headers.len(), 3);
        assert_eq!(request.header("x-request-id"), Some("abc"));
        assert_eq!(request.header("Authorization"), Some("Bearer token-1"));
        assert_eq!(
            request.header("Content-Type"),
            Some("application/json; charset=utf-8")
        );
    }

    #[test]
    fn cancel_and_delete_return_acknowledgements() {
        let (client, transport, _) = setup(FakeCredentials::signed_in("user_1"));
        transport.respond_json(200, json!({"message": "Order cancelled successfully"}));
        transport.respond_json(200, json!({"message": "Menu item deleted"}));

        let cancelled = block_on(client.cancel_order("1")).unwrap();
        let deleted = block_on(client.delete_menu_item("2")).unwrap();

        assert_eq!(cancelled.message, "Order cancelled successfully");
        assert_eq!(deleted.message, "Menu item deleted");
        assert_eq!(transport.requests()[1].method, Method::Delete);
    }
}
