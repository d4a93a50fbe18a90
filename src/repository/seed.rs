use chrono::{DateTime, Utc};

use crate::models::{Category, MenuItem};

pub(super) fn categories() -> Vec<Category> {
    [
        ("cat_1", "Starters", "🥗"),
        ("cat_2", "Main Course", "🍛"),
        ("cat_3", "Beverages", "🍹"),
        ("cat_4", "Desserts", "🍰"),
        ("cat_5", "Snacks", "🍟"),
    ]
    .into_iter()
    .zip(1..)
    .map(|((id, name, icon), order)| Category {
        id: id.to_string(),
        name: name.to_string(),
        icon: icon.to_string(),
        order,
    })
    .collect()
}

pub(super) fn menu_items(now: DateTime<Utc>) -> Vec<MenuItem> {
    [
        ("item_1", "Paneer Tikka", 280.0, "cat_1", 25, "paneer_tikka", "Grilled cottage cheese with spices"),
        ("item_2", "Chicken Wings", 320.0, "cat_1", 30, "chicken_wings", "Crispy fried chicken wings"),
        ("item_3", "Veg Spring Rolls", 180.0, "cat_1", 40, "spring_rolls", "Crispy vegetable rolls"),
        ("item_4", "Butter Chicken", 380.0, "cat_2", 20, "butter_chicken", "Creamy tomato chicken curry"),
        ("item_5", "Dal Makhani", 260.0, "cat_2", 25, "dal_makhani", "Creamy black lentils"),
        ("item_6", "Biryani", 320.0, "cat_2", 30, "biryani", "Aromatic rice with spices"),
        ("item_7", "Naan Bread", 60.0, "cat_2", 100, "naan_bread", "Freshly baked garlic naan"),
        ("item_8", "Mojito", 180.0, "cat_3", 50, "mojito", "Refreshing mint cocktail"),
        ("item_9", "Beer", 250.0, "cat_3", 100, "beer", "Chilled premium beer"),
        ("item_10", "Fresh Juice", 120.0, "cat_3", 100, "fresh_juice", "Fresh orange juice"),
        ("item_11", "Gulab Jamun", 120.0, "cat_4", 40, "gulab_jamun", "Sweet milk dumplings in syrup"),
        ("item_12", "Chocolate Brownie", 180.0, "cat_4", 50, "brownie", "Rich brownie with ice cream"),
    ]
    .into_iter()
    .map(|(id, name, price, category_id, stock, image, description)| MenuItem {
        id: id.to_string(),
        name: name.to_string(),
        price,
        category_id: category_id.to_string(),
        stock,
        icon: String::new(),
        image: Some(format!("images/{}.png", image)),
        description: Some(description.to_string()),
        created_at: Some(now),
        updated_at: None,
    })
    .collect()
}
