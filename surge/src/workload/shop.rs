//! Sock shop argument generators.
use super::registry::{ArgGenerator, Encoding, Params};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

pub(crate) const GENERATORS: &[(&str, ArgGenerator)] = &[
    ("sockshop_GetCart", get_cart),
    ("sockshop_DeleteCart", delete_cart),
    ("sockshop_AddItem", add_item),
    ("sockshop_RemoveItem", remove_item),
    ("sockshop_UpdateItem", update_item),
    ("sockshop_ListItems", list_items),
    ("sockshop_GetSock", get_sock),
    ("sockshop_ListTags", list_tags),
    ("sockshop_NewOrder", new_order),
    ("sockshop_GetOrders", get_orders),
    ("sockshop_GetOrder", get_order),
    ("sockshop_Login", login),
    ("sockshop_Register", register),
    ("sockshop_GetUser", get_user),
    ("sockshop_GetAddress", get_address),
    ("sockshop_PostAddress", post_address),
    ("sockshop_GetCard", get_card),
    ("sockshop_PostCard", post_card),
    ("sockshop_LoadCatalogue", load_catalogue),
];

const SOCKS: &[&str] = &[
    "Weave special",
    "Nerd leg",
    "Crossed",
    "SuperSport XL",
    "Holy",
    "YouTube.sock",
    "Figueroa",
    "Classic",
    "Colourful",
    "Cat socks",
];

const TAGS: &[&str] = &[
    "brown", "geek", "formal", "blue", "skin", "red", "action", "sport", "black", "magic", "green",
];

const ORDERS: &[&str] = &["", "name", "price", "quantity"];

const STREETS: &[&str] = &["Main St", "Oak Ave", "Pine Rd", "Elm St", "Cedar Ln"];
const COUNTRIES: &[&str] = &["USA", "UK", "Germany", "France", "Canada"];
const CITIES: &[&str] = &["New York", "London", "Berlin", "Paris", "Toronto"];

/// Customer every new address is attached to.
const ADDRESS_OWNER: &str = "b58a67ef-dc90-4be3-97c9-ec6e2f243705";

/// 24 hex characters, shaped like a MongoDB ObjectId.
pub(crate) fn object_id(rng: &mut dyn RngCore) -> String {
    const HEX: &[u8] = b"abcdef0123456789";
    (0..24)
        .map(|_| HEX[rng.gen_range(0..HEX.len())] as char)
        .collect()
}

fn pick<'a>(rng: &mut dyn RngCore, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

/// Empty with probability `1 - p`, a fresh session id otherwise.
fn maybe_session(rng: &mut dyn RngCore, p: f64) -> String {
    if rng.gen_bool(p) {
        object_id(rng)
    } else {
        String::new()
    }
}

fn get_cart(rng: &mut dyn RngCore, enc: Encoding) -> Params {
    let session = maybe_session(rng, 0.8);
    vec![("sessionID", enc.text(&session))]
}

fn delete_cart(rng: &mut dyn RngCore, enc: Encoding) -> Params {
    vec![("sessionID", enc.text(&object_id(rng)))]
}

fn add_item(rng: &mut dyn RngCore, enc: Encoding) -> Params {
    let session = maybe_session(rng, 0.7);
    vec![
        ("sessionID", enc.text(&session)),
        ("itemID", enc.text(pick(rng, SOCKS))),
    ]
}

fn remove_item(rng: &mut dyn RngCore, enc: Encoding) -> Params {
    vec![
        ("sessionID", enc.text(&object_id(rng))),
        ("itemID", enc.text(pick(rng, SOCKS))),
    ]
}

fn update_item(rng: &mut dyn RngCore, enc: Encoding) -> Params {
    let session = maybe_session(rng, 0.7);
    let item = pick(rng, SOCKS);
    let quantity = rng.gen_range(1..=5);
    vec![
        ("sessionID", enc.text(&session)),
        ("itemID", enc.text(item)),
        ("quantity", enc.value(&quantity)),
    ]
}

fn list_items(rng: &mut dyn RngCore, enc: Encoding) -> Params {
    let count = rng.gen_range(1..=3);
    let tags: Vec<&str> = (0..count).map(|_| pick(rng, TAGS)).collect();
    vec![
        ("tags", enc.value(&tags)),
        ("order", enc.text(pick(rng, ORDERS))),
        ("pageNum", enc.value(&1)),
        ("pageSize", enc.value(&20)),
    ]
}

fn get_sock(rng: &mut dyn RngCore, enc: Encoding) -> Params {
    vec![("itemID", enc.text(pick(rng, SOCKS)))]
}

fn list_tags(_rng: &mut dyn RngCore, _enc: Encoding) -> Params {
    vec![]
}

fn new_order(rng: &mut dyn RngCore, enc: Encoding) -> Params {
    vec![
        ("customerID", enc.text(&object_id(rng))),
        ("addressID", enc.text(&object_id(rng))),
        ("cardID", enc.text(&object_id(rng))),
        ("cartID", enc.text(&object_id(rng))),
    ]
}

fn get_orders(rng: &mut dyn RngCore, enc: Encoding) -> Params {
    vec![("userID", enc.text(&object_id(rng)))]
}

fn get_order(rng: &mut dyn RngCore, enc: Encoding) -> Params {
    vec![("orderID", enc.text(&object_id(rng)))]
}

fn login(rng: &mut dyn RngCore, enc: Encoding) -> Params {
    let session = maybe_session(rng, 0.5);
    let user = rng.gen_range(0..500);
    vec![
        ("sessionID", enc.text(&session)),
        ("username", enc.text(&format!("sockshop_user_{user}"))),
        ("password", enc.text(&format!("password{user}"))),
    ]
}

fn register(rng: &mut dyn RngCore, enc: Encoding) -> Params {
    let session = maybe_session(rng, 0.5);
    let user = rng.gen_range(0..10_000);
    let username = format!("new_user_{user}");
    vec![
        ("sessionID", enc.text(&session)),
        ("username", enc.text(&username)),
        ("password", enc.text(&format!("newpass{user}"))),
        ("email", enc.text(&format!("{username}@sockshop.com"))),
        ("first", enc.text(&format!("First{user}"))),
        ("last", enc.text(&format!("Last{user}"))),
    ]
}

fn get_user(rng: &mut dyn RngCore, enc: Encoding) -> Params {
    vec![("userID", enc.text(&object_id(rng)))]
}

fn get_address(rng: &mut dyn RngCore, enc: Encoding) -> Params {
    vec![("addressID", enc.text(&object_id(rng)))]
}

fn post_address(rng: &mut dyn RngCore, enc: Encoding) -> Params {
    let street = pick(rng, STREETS);
    let number = rng.gen_range(1..=9_999).to_string();
    let country = pick(rng, COUNTRIES);
    let city = pick(rng, CITIES);
    let post_code = rng.gen_range(10_000..110_000).to_string();
    vec![
        ("userID", enc.text(ADDRESS_OWNER)),
        ("street", enc.text(street)),
        ("number", enc.text(&number)),
        ("country", enc.text(country)),
        ("city", enc.text(city)),
        ("postCode", enc.text(&post_code)),
    ]
}

fn get_card(rng: &mut dyn RngCore, enc: Encoding) -> Params {
    vec![("cardID", enc.text(&object_id(rng)))]
}

fn digits(rng: &mut dyn RngCore, n: usize) -> String {
    (0..n)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

fn post_card(rng: &mut dyn RngCore, enc: Encoding) -> Params {
    let user = object_id(rng);
    let long_num = format!("4{}", digits(rng, 15));
    let month = rng.gen_range(1..=12);
    let year = rng.gen_range(24..34);
    let ccv = digits(rng, 3);
    vec![
        ("userID", enc.text(&user)),
        ("longNum", enc.text(&long_num)),
        ("expires", enc.text(&format!("{month:02}/{year}"))),
        ("ccv", enc.text(&ccv)),
    ]
}

fn load_catalogue(_rng: &mut dyn RngCore, _enc: Encoding) -> Params {
    vec![]
}
