//! Site content
//!
//! Everything the pages show is literal data defined here. Prices are integer
//! cents and rendered with the `money` helper.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

/// Page payload handed to the renderer
pub type PageData = Map<String, Value>;

/// Home page banner
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Hero {
    pub title: String,
    pub subtitle: String,
    pub image: String,
}

/// A featured category on the home page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub name: String,
    pub image: String,
}

/// A way of preparing a product, possibly costing extra
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Variant {
    pub name: String,
    pub price_adj_cents: i64,
}

/// Something that can be added to a product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddOn {
    pub name: String,
    pub price_cents: i64,
}

/// A menu item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: u32,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub base_price_cents: i64,
    pub image: String,
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub add_ons: Vec<AddOn>,
}

/// One line of the cart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    pub name: String,
    pub variant: String,
    pub price_cents: i64,
    pub qty: u32,
}

impl CartItem {
    pub fn line_total_cents(&self) -> i64 {
        self.price_cents * i64::from(self.qty)
    }
}

/// The sample cart shown on the checkout page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cart {
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Sum of all line totals
    pub fn total_cents(&self) -> i64 {
        self.items.iter().map(CartItem::line_total_cents).sum()
    }
}

fn variant(name: &str, price_adj_cents: i64) -> Variant {
    Variant {
        name: name.to_string(),
        price_adj_cents,
    }
}

fn add_on(name: &str, price_cents: i64) -> AddOn {
    AddOn {
        name: name.to_string(),
        price_cents,
    }
}

pub fn hero() -> Hero {
    Hero {
        title: "Experience Culinary Excellence".to_string(),
        subtitle: "From farm to table, we serve the finest ingredients with passion.".to_string(),
        image: "https://images.unsplash.com/photo-1514362545857-3bc16c4c7d1b?auto=format&fit=crop&w=1920&q=80"
            .to_string(),
    }
}

pub fn featured_categories() -> Vec<Category> {
    [
        ("Signature Steaks", "https://images.unsplash.com/photo-1546248133-12832329b310?w=400"),
        ("Fresh Seafood", "https://images.unsplash.com/photo-1519708227418-c8fd9a32b7a2?w=400"),
        ("Craft Cocktails", "https://images.unsplash.com/photo-1514362545857-3bc16c4c7d1b?w=400"),
    ]
    .into_iter()
    .map(|(name, image)| Category {
        name: name.to_string(),
        image: image.to_string(),
    })
    .collect()
}

pub fn products() -> Vec<Product> {
    vec![
        Product {
            id: 1,
            slug: "classic-ribeye".to_string(),
            name: "Classic Ribeye".to_string(),
            description: "300g Aged Angus Ribeye with garlic butter and rosemary.".to_string(),
            base_price_cents: 3499,
            image: "https://images.unsplash.com/photo-1546248133-12832329b310?w=600".to_string(),
            variants: vec![
                variant("Rare", 0),
                variant("Medium Rare", 0),
                variant("Medium", 0),
                variant("Well Done", 0),
            ],
            add_ons: vec![add_on("Truffle Butter", 450), add_on("Grilled Prawns", 1200)],
        },
        Product {
            id: 2,
            slug: "atlantic-salmon".to_string(),
            name: "Atlantic Salmon".to_string(),
            description: "Pan-seared salmon with asparagus and lemon hollandaise.".to_string(),
            base_price_cents: 2850,
            image: "https://images.unsplash.com/photo-1519708227418-c8fd9a32b7a2?w=600".to_string(),
            variants: vec![variant("Standard", 0), variant("Large Cut", 800)],
            add_ons: Vec::new(),
        },
    ]
}

pub fn find_product(slug: &str) -> Option<Product> {
    debug!(%slug, "find_product: called");
    products().into_iter().find(|p| p.slug == slug)
}

pub fn cart() -> Cart {
    Cart {
        items: vec![
            CartItem {
                name: "Classic Ribeye".to_string(),
                variant: "Medium Rare".to_string(),
                price_cents: 3499,
                qty: 1,
            },
            CartItem {
                name: "Truffle Butter".to_string(),
                variant: "Add-on".to_string(),
                price_cents: 450,
                qty: 1,
            },
        ],
    }
}

/// UI strings for a locale; unknown locales get English
pub fn i18n(locale: &str) -> Value {
    match locale {
        "ur" => json!({
            "add_to_cart": "کارٹ میں شامل کریں",
            "menu": "مینو",
            "checkout": "چیک آؤٹ",
            "total": "کل",
            "continue_shopping": "خریداری جاری رکھیں",
        }),
        _ => json!({
            "add_to_cart": "Add to Cart",
            "menu": "Menu",
            "checkout": "Checkout",
            "total": "Total",
            "continue_shopping": "Continue Shopping",
        }),
    }
}

fn to_value<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn page(title: &str, locale: &str) -> PageData {
    let mut data = PageData::new();
    data.insert("title".to_string(), Value::String(title.to_string()));
    data.insert("i18n".to_string(), i18n(locale));
    data
}

pub fn home_page(locale: &str) -> PageData {
    let mut data = page("Gourmet Grill | Best Steaks in Town", locale);
    data.insert("hero".to_string(), to_value(hero()));
    data.insert("featured_categories".to_string(), to_value(featured_categories()));
    data
}

pub fn menu_page(locale: &str) -> PageData {
    let mut data = page("Our Menu | Gourmet Grill", locale);
    data.insert("products".to_string(), to_value(products()));
    data
}

pub fn checkout_page(locale: &str) -> PageData {
    let cart = cart();
    let mut data = page("Secure Checkout | Gourmet Grill", locale);
    data.insert("total_cents".to_string(), Value::from(cart.total_cents()));
    data.insert("cart_items".to_string(), to_value(cart.items));
    data
}

pub fn product_page(slug: &str, locale: &str) -> Option<PageData> {
    let product = find_product(slug)?;
    let mut data = page(&format!("{} | Gourmet Grill", product.name), locale);
    data.insert("product".to_string(), to_value(product));
    Some(data)
}
