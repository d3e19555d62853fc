//! Shared test data for repository tests.

use optica_core::{ClientDraft, ProductDraft, SupplierDraft};

use crate::{Database, DbConfig};

pub(crate) async fn setup() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

pub(crate) fn client_draft(rut: &str) -> ClientDraft {
    ClientDraft {
        name: "Ana".to_string(),
        last_name: "Rojas".to_string(),
        rut: rut.to_string(),
        phone: "+56 9 1111 2222".to_string(),
        email: "ana@example.cl".to_string(),
        address: "Av. Matta 123, Santiago".to_string(),
    }
}

pub(crate) fn product_draft(name: &str, stock: i64) -> ProductDraft {
    ProductDraft {
        name: name.to_string(),
        category: "Armazón".to_string(),
        brand: "Ray-Ban".to_string(),
        stock,
        cost_price: 20_000,
        sale_price: 45_000,
    }
}

pub(crate) fn supplier_draft(name: &str) -> SupplierDraft {
    SupplierDraft {
        name: name.to_string(),
        contact: "Luis Pérez".to_string(),
        phone: "+56 2 2222 3333".to_string(),
        address: "San Diego 456, Santiago".to_string(),
    }
}
