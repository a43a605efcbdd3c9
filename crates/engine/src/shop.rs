//! The GoPoints shop.
//!
//! The catalog is hard-coded app content; purchases only touch the user's
//! GoPoints balance, no inventory or order record is kept.

/// An item purchasable with GoPoints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShopItem {
    pub name: &'static str,
    pub image_url: &'static str,
    pub cost: i64,
}

/// The shop inventory.
pub fn catalog() -> Vec<ShopItem> {
    vec![
        ShopItem {
            name: "Nike Downshifter 12 sneakers",
            image_url: "https://a.lmcdn.ru/img600x866/M/P/MP002XM0B4SQ_21088808_1_v1.jpg",
            cost: 10000,
        },
        ShopItem {
            name: "Nike training shirt",
            image_url: "https://a.lmcdn.ru/pi/img600x866/R/T/RTLAAR357501_15207200_1_v1.jpg",
            cost: 4000,
        },
        ShopItem {
            name: "Nike training shorts",
            image_url: "https://cdn.sportmaster.ru/upload/resize_cache/iblock/4d0/768_1024_1/51055900299.jpg",
            cost: 5000,
        },
        ShopItem {
            name: "Dumbbell 1 kg",
            image_url: "https://cdn.sportmaster.ru/upload/resize_cache/iblock/011/1008_800_1/58007200299.jpg",
            cost: 1000,
        },
        ShopItem {
            name: "Dumbbell 2 kg",
            image_url: "https://cdn.sportmaster.ru/upload/resize_cache/iblock/c08/1008_800_1/58007270299.jpg",
            cost: 1500,
        },
        ShopItem {
            name: "Dumbbell 3 kg",
            image_url: "https://cdn.sportmaster.ru/upload/resize_cache/iblock/dfa/1008_800_1/58007280299.jpg",
            cost: 2000,
        },
        ShopItem {
            name: "Dumbbell 5 kg",
            image_url: "https://cdn.sportmaster.ru/upload/resize_cache/iblock/04f/1008_800_1/58007370299.jpg",
            cost: 2500,
        },
    ]
}
