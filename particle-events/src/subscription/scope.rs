//! Which event stream to open

/// An event stream on the Particle Device Cloud API
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionScope {
    /// The public event firehose
    Public,
    /// Events from every device owned by the token's user
    Mine,
    /// Events from one device
    Device(String),
    /// Events from every device in a product (id or slug)
    Product(String),
}

impl SubscriptionScope {
    /// Request path for this stream, optionally filtered by event name prefix
    pub fn path(&self, prefix: Option<&str>) -> String {
        let mut path = match self {
            SubscriptionScope::Public => "/v1/events".to_string(),
            SubscriptionScope::Mine => "/v1/devices/events".to_string(),
            SubscriptionScope::Device(id) => {
                format!("/v1/devices/{}/events", urlencoding::encode(id))
            }
            SubscriptionScope::Product(product) => {
                format!("/v1/products/{}/events", urlencoding::encode(product))
            }
        };

        if let Some(prefix) = prefix {
            path.push('/');
            path.push_str(&urlencoding::encode(prefix));
        }
        path
    }
}
