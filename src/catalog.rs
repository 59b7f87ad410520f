use crate::models::Product;

const ACNE_KEYWORDS: [&str; 2] = ["acne", "face wash"];

/// Read-only product list shared by every request.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Binary keyword match: acne / face wash questions get the acne-prone
    /// face washes, everything else gets nothing.
    pub fn filter_products(&self, message: &str) -> Vec<Product> {
        let message = message.to_lowercase();
        if !ACNE_KEYWORDS.iter().any(|k| message.contains(k)) {
            return Vec::new();
        }
        self.products
            .iter()
            .filter(|p| p.product_type == "face wash" && p.skin_type == "acne-prone")
            .cloned()
            .collect()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        let product = |name: &str, product_type: &str, skin_type: &str, price: f64, image_url: &str, description: &str| Product {
            name: name.to_string(),
            product_type: product_type.to_string(),
            skin_type: skin_type.to_string(),
            price,
            image_url: image_url.to_string(),
            description: description.to_string(),
        };

        Self::new(vec![
            product(
                "CeraVe Acne Foaming Cream Cleanser",
                "face wash",
                "acne-prone",
                14.99,
                "https://images.beautyadvisor.app/products/cerave-acne-foaming-cleanser.jpg",
                "Foaming cream cleanser with 4% benzoyl peroxide that clears breakouts without stripping the skin barrier.",
            ),
            product(
                "La Roche-Posay Effaclar Medicated Gel Cleanser",
                "face wash",
                "acne-prone",
                16.99,
                "https://images.beautyadvisor.app/products/effaclar-gel-cleanser.jpg",
                "2% salicylic acid gel cleanser that unclogs pores and reduces excess oil.",
            ),
            product(
                "Neutrogena Oil-Free Acne Wash",
                "face wash",
                "acne-prone",
                8.49,
                "https://images.beautyadvisor.app/products/neutrogena-oil-free-acne-wash.jpg",
                "Daily salicylic acid wash that treats and helps prevent breakouts.",
            ),
            product(
                "Cetaphil Gentle Skin Cleanser",
                "face wash",
                "sensitive",
                11.99,
                "https://images.beautyadvisor.app/products/cetaphil-gentle-cleanser.jpg",
                "Soap-free, fragrance-free cleanser for dry and sensitive skin.",
            ),
            product(
                "Neutrogena Hydro Boost Water Gel",
                "moisturizer",
                "dry",
                19.97,
                "https://images.beautyadvisor.app/products/hydro-boost-water-gel.jpg",
                "Lightweight hyaluronic acid gel that delivers long-lasting hydration.",
            ),
            product(
                "The Ordinary Niacinamide 10% + Zinc 1%",
                "serum",
                "oily",
                6.50,
                "https://images.beautyadvisor.app/products/ordinary-niacinamide-zinc.jpg",
                "High-strength vitamin and mineral serum that targets blemishes and congestion.",
            ),
            product(
                "EltaMD UV Clear Broad-Spectrum SPF 46",
                "sunscreen",
                "acne-prone",
                41.00,
                "https://images.beautyadvisor.app/products/eltamd-uv-clear.jpg",
                "Oil-free facial sunscreen with niacinamide, suited to breakout-prone skin.",
            ),
        ])
    }
}
