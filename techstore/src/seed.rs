// techstore/src/seed.rs

//! Sample catalog and accounts for local runs. Only loads into an empty store.

use rust_decimal::Decimal;
use tracing::{info, instrument};

use crate::errors::Result as AppResult;
use crate::models::{NewProduct, NewUser, Role};
use crate::services::auth_service::hash_password;
use crate::store::{ProductRepository, Store, UserRepository};

const USERS: &[(&str, &str, &str, Role)] = &[
  ("Administrador", "admin@techstore.com", "admin123", Role::Admin),
  ("Juan Pérez", "juan@email.com", "user123", Role::User),
  ("María García", "maria@test.com", "test123", Role::User),
];

// (name, description, price in cents, stock, image, category)
const PRODUCTS: &[(&str, &str, i64, i32, &str, &str)] = &[
  (
    "MacBook Pro M3 14\"",
    "Laptop profesional con chip M3, 16GB RAM, 512GB SSD y pantalla Retina de 14 pulgadas",
    199999,
    10,
    "https://images.unsplash.com/photo-1517336714731-489689fd1ca8?w=400",
    "laptops",
  ),
  (
    "Dell XPS 13 Plus",
    "Ultrabook premium con Intel Core i7, 16GB RAM, 1TB SSD y pantalla InfinityEdge",
    159999,
    15,
    "https://images.unsplash.com/photo-1496181133206-80ce9b88a853?w=400",
    "laptops",
  ),
  (
    "ASUS ROG Strix G15",
    "Laptop gaming con AMD Ryzen 9, NVIDIA RTX 4070, 32GB RAM ideal para juegos",
    189999,
    8,
    "https://images.unsplash.com/photo-1603302576837-37561b2e2302?w=400",
    "laptops",
  ),
  (
    "Samsung Odyssey G7 32\"",
    "Monitor gaming curvo 4K 144Hz con HDR1000 y tecnología QLED",
    79999,
    12,
    "https://images.unsplash.com/photo-1527443224154-c4a3942d3acf?w=400",
    "monitores",
  ),
  (
    "LG UltraWide 34\" 5K",
    "Monitor ultrawide para productividad con USB-C y calibración de color profesional",
    129999,
    7,
    "https://images.unsplash.com/photo-1560472354-b33ff0c44a43?w=400",
    "monitores",
  ),
  (
    "AirPods Pro 2da Gen",
    "Audífonos inalámbricos con cancelación activa de ruido mejorada y audio espacial",
    24999,
    50,
    "https://images.unsplash.com/photo-1606220945770-b5b6c2c55bf1?w=400",
    "audifonos",
  ),
  (
    "Sony WH-1000XM5",
    "Audífonos over-ear premium con la mejor cancelación de ruido y 30h de batería",
    34999,
    30,
    "https://images.unsplash.com/photo-1618366712010-f4ae9c647dcb?w=400",
    "audifonos",
  ),
  (
    "Bose QuietComfort Ultra",
    "Audífonos de diadema con cancelación de ruido inmersiva y sonido espacial",
    42999,
    20,
    "https://images.unsplash.com/photo-1583394838336-acd977736f90?w=400",
    "audifonos",
  ),
  (
    "iPhone 15 Pro Max",
    "El iPhone más avanzado con chip A17 Pro, cámara de 48MP y titanio",
    119999,
    25,
    "https://images.unsplash.com/photo-1695048133142-1a20484d2569?w=400",
    "telefonos",
  ),
  (
    "Samsung Galaxy S24 Ultra",
    "Smartphone premium con S Pen, cámara de 200MP y pantalla Dynamic AMOLED 2X",
    129999,
    18,
    "https://images.unsplash.com/photo-1610945265064-0e34e5519bbf?w=400",
    "telefonos",
  ),
  (
    "iPad Pro 12.9\" M2",
    "Tablet profesional con chip M2, pantalla Liquid Retina XDR y soporte para Apple Pencil",
    109999,
    15,
    "https://images.unsplash.com/photo-1544244015-0df4b3ffc6b0?w=400",
    "tablets",
  ),
  (
    "Logitech MX Master 3S",
    "Mouse inalámbrico ergonómico para productividad con scroll electromagnético",
    9999,
    45,
    "https://images.unsplash.com/photo-1527814050087-3793815479db?w=400",
    "accesorios",
  ),
  (
    "Razer BlackWidow V4 Pro",
    "Teclado mecánico gaming con switches Green, RGB Chroma y control de comandos",
    22999,
    30,
    "https://images.unsplash.com/photo-1541140532154-b024d705b90a?w=400",
    "accesorios",
  ),
];

/// Inserts the sample users and products. Each table is only filled when it is empty,
/// so restarting against a persistent database is a no-op.
#[instrument(name = "seed::seed_if_empty", skip(store), err(Display))]
pub async fn seed_if_empty(store: &dyn Store) -> AppResult<()> {
  let mut tx = store.begin().await?;

  if tx.count_users().await? == 0 {
    for (name, email, password, role) in USERS {
      let user = NewUser {
        name: (*name).to_string(),
        email: (*email).to_string(),
        password_hash: hash_password(password)?,
        role: *role,
      };
      tx.insert_user(&user).await?;
    }
    info!(count = USERS.len(), "Seeded users.");
  }

  if tx.count_products().await? == 0 {
    for (name, description, cents, stock, image_url, category) in PRODUCTS {
      let product = NewProduct {
        name: (*name).to_string(),
        description: Some((*description).to_string()),
        price: Decimal::new(*cents, 2),
        stock: *stock,
        image_url: Some((*image_url).to_string()),
        category: Some((*category).to_string()),
      };
      tx.insert_product(&product).await?;
    }
    info!(count = PRODUCTS.len(), "Seeded products.");
  }

  tx.commit().await?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::memory::MemoryStore;

  #[tokio::test]
  async fn seeds_once() {
    let store = MemoryStore::new();
    seed_if_empty(&store).await.unwrap();
    seed_if_empty(&store).await.unwrap();

    let mut tx = store.begin().await.unwrap();
    assert_eq!(tx.count_users().await.unwrap(), USERS.len() as i64);
    assert_eq!(tx.count_products().await.unwrap(), PRODUCTS.len() as i64);
    let admin = tx.find_user_by_email("ADMIN@techstore.com").await.unwrap().unwrap();
    assert_eq!(admin.role, Role::Admin);
  }
}
