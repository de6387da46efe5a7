//! Parser for the marketplace page-JSON payloads.
//!
//! A payload carries a `widgetStates` object whose values are themselves
//! JSON documents encoded as strings. Anything that does not match the
//! expected shape degrades to "no data" and is logged.

use crate::ozon::marketplace::{LISTING_WIDGET_PREFIX, SELLER_WIDGET_PREFIX};
use crate::ozon::models::ProductRef;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

#[derive(Debug, Default, Deserialize)]
struct PagePayload {
    #[serde(default, rename = "widgetStates")]
    widget_states: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ListingWidget {
    #[serde(default)]
    items: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ListingItem {
    #[serde(default)]
    action: Option<ItemAction>,
    #[serde(default, rename = "skuId")]
    sku_id: Option<Value>,
    #[serde(default, rename = "mainState")]
    main_state: Vec<StateAtom>,
}

#[derive(Debug, Deserialize)]
struct ItemAction {
    #[serde(default)]
    link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StateAtom {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    atom: Option<AtomBody>,
}

#[derive(Debug, Deserialize)]
struct AtomBody {
    #[serde(default, rename = "textAtom")]
    text_atom: Option<TextAtom>,
}

#[derive(Debug, Deserialize)]
struct TextAtom {
    #[serde(default)]
    text: Option<String>,
}

/// Raw content of the current-seller widget.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SellerWidget {
    #[serde(default)]
    pub credentials: Vec<Value>,
    #[serde(default)]
    pub link: Option<String>,
}

/// Fields picked out of the seller's `credentials` disclosure array.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SellerCredentials {
    pub identity: String,
    pub registration_id: Option<String>,
    pub tenure_marker: String,
}

/// Result of parsing one listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub products: Vec<ProductRef>,
    /// Number of raw items on the page, usable or not
    pub item_count: usize,
}

impl ListingPage {
    /// An empty page ends the walk.
    pub fn is_empty(&self) -> bool {
        self.item_count == 0
    }
}

fn parse_payload(body: &str) -> PagePayload {
    match serde_json::from_str(body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Malformed page payload, treating as empty: {}", e);
            PagePayload::default()
        }
    }
}

/// Decodes the first widget whose key starts with `prefix`.
fn find_widget<W: DeserializeOwned>(payload: &PagePayload, prefix: &str) -> Option<W> {
    let (key, raw) = payload.widget_states.iter().find(|(key, _)| key.starts_with(prefix))?;

    let decoded = match raw {
        Value::String(encoded) => serde_json::from_str(encoded),
        other => serde_json::from_value(other.clone()),
    };

    match decoded {
        Ok(widget) => Some(widget),
        Err(e) => {
            warn!("Malformed widget {}: {}", key, e);
            None
        }
    }
}

/// Parses a category listing page into product references.
pub fn parse_listing(body: &str) -> ListingPage {
    let payload = parse_payload(body);
    let widget: ListingWidget = find_widget(&payload, LISTING_WIDGET_PREFIX).unwrap_or_default();

    let mut page = ListingPage { products: Vec::new(), item_count: widget.items.len() };

    for raw in widget.items {
        let item: ListingItem = match serde_json::from_value(raw) {
            Ok(item) => item,
            Err(e) => {
                warn!("Skipping malformed listing item: {}", e);
                continue;
            }
        };

        match parse_item(&item) {
            Some(product) => {
                trace!("Parsed product: {} - {}", product.id, product.name);
                page.products.push(product);
            }
            None => warn!("Skipping listing item without product id (sku {:?})", item.sku_id),
        }
    }

    debug!(
        "Listing page gave {:?}",
        page.products.iter().map(|p| p.id.as_str()).collect::<Vec<_>>()
    );

    page
}

fn parse_item(item: &ListingItem) -> Option<ProductRef> {
    let sku = match item.sku_id.as_ref()? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if sku.is_empty() {
        return None;
    }

    let link = item.action.as_ref()?.link.as_deref()?;
    let id = link.split('/').find(|segment| segment.contains(sku.as_str()))?;

    let name = item
        .main_state
        .iter()
        .find(|atom| atom.id.as_deref() == Some("name"))
        .and_then(|atom| atom.atom.as_ref())
        .and_then(|body| body.text_atom.as_ref())
        .and_then(|text| text.text.clone())
        .unwrap_or_default();

    Some(ProductRef::new(id, name))
}

/// Finds the current-seller widget on a product page.
pub fn parse_seller_widget(body: &str) -> Option<SellerWidget> {
    let payload = parse_payload(body);
    find_widget(&payload, SELLER_WIDGET_PREFIX)
}

/// Picks identity, registration id and tenure marker out of `credentials`.
///
/// Element 0 is the identity, the first purely numeric element among 1..=4 is
/// the registration id and element 4 is the tenure marker.
pub fn parse_credentials(credentials: &[Value]) -> SellerCredentials {
    let text_at = |idx: usize| credentials.get(idx).and_then(Value::as_str);

    let registration_id = (1..=4)
        .filter_map(text_at)
        .find(|s| is_numeric(s))
        .map(str::to_string);

    SellerCredentials {
        identity: text_at(0).unwrap_or_default().to_string(),
        registration_id,
        tenure_marker: text_at(4).unwrap_or_default().to_string(),
    }
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}
