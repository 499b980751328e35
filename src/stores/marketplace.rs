//! Verified services marketplace
//!
//! The catalogue is fixed; filtering is a pure function of the category
//! selection and the search text.

use crate::error::GuardianError;
use crate::models::{CategoryFilter, Service, ServiceCategory};
use crate::Result;
use serde::{Deserialize, Serialize};

/// One entry of the category bar
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CategoryOption {
    pub id: CategoryFilter,
    pub name: &'static str,
}

pub fn categories() -> Vec<CategoryOption> {
    vec![
        CategoryOption { id: CategoryFilter::All, name: "Todos" },
        CategoryOption { id: CategoryFilter::Only(ServiceCategory::Health), name: "Salud" },
        CategoryOption { id: CategoryFilter::Only(ServiceCategory::Legal), name: "Legal" },
        CategoryOption { id: CategoryFilter::Only(ServiceCategory::Home), name: "Hogar" },
        CategoryOption { id: CategoryFilter::Only(ServiceCategory::Insurance), name: "Seguros" },
    ]
}

/// True when `service` passes the category selection
pub fn matches_category(service: &Service, category: CategoryFilter) -> bool {
    category.matches(service.category)
}

/// True when the name or description contains `search`, ignoring case
pub fn matches_search(service: &Service, search: &str) -> bool {
    let needle = search.to_lowercase();
    service.name.to_lowercase().contains(&needle)
        || service.description.to_lowercase().contains(&needle)
}

pub fn filter_services<'a>(
    services: &'a [Service],
    category: CategoryFilter,
    search: &str,
) -> Vec<&'a Service> {
    services
        .iter()
        .filter(|s| matches_category(s, category) && matches_search(s, search))
        .collect()
}

/// Current query on the marketplace screen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceQuery {
    pub category: CategoryFilter,
    pub search: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marketplace {
    services: Vec<Service>,
    query: MarketplaceQuery,
}

impl Marketplace {
    pub fn seeded() -> Self {
        Self {
            services: catalogue(),
            query: MarketplaceQuery::default(),
        }
    }

    pub fn all(&self) -> &[Service] {
        &self.services
    }

    pub fn query(&self) -> &MarketplaceQuery {
        &self.query
    }

    pub fn set_query(&mut self, query: MarketplaceQuery) {
        self.query = query;
    }

    /// Services passing the current query
    pub fn visible(&self) -> Vec<&Service> {
        filter_services(&self.services, self.query.category, &self.query.search)
    }

    pub fn require(&self, id: &str) -> Result<&Service> {
        self.services
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| GuardianError::NotFound(format!("service {}", id)))
    }
}

impl Default for Marketplace {
    fn default() -> Self {
        Self::seeded()
    }
}

/// Seed listings. The telemedicine and insurance descriptions read "de salud" and
/// "vida y oncológicos" so that searching "salud" matches only telemedicine.
fn catalogue() -> Vec<Service> {
    let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    vec![
        Service {
            id: "1".to_string(),
            name: "Dr. Patricia Morales - Telemedicina".to_string(),
            category: ServiceCategory::Health,
            description: "Consultas de salud por videollamada. Especialista en medicina familiar y geriatría.".to_string(),
            rating: 4.9,
            review_count: 127,
            phone: "+56 9 8765 4321".to_string(),
            location: "Disponible 24/7".to_string(),
            verified: true,
            specialties: strings(&["Medicina General", "Geriatría", "Consultas Online"]),
            price: "Desde $25.000".to_string(),
        },
        Service {
            id: "2".to_string(),
            name: "Estudio Jurídico González & Asociados".to_string(),
            category: ServiceCategory::Legal,
            description: "Especialistas en testamentos y trámites de herencia para adultos mayores.".to_string(),
            rating: 4.8,
            review_count: 89,
            phone: "+56 2 2345 6789".to_string(),
            location: "Providencia, Santiago".to_string(),
            verified: true,
            specialties: strings(&["Testamentos", "Herencias", "Poderes"]),
            price: "Consulta gratuita".to_string(),
        },
        Service {
            id: "3".to_string(),
            name: "Reparaciones del Hogar \"Don Luis\"".to_string(),
            category: ServiceCategory::Home,
            description: "Servicios de plomería, electricidad y reparaciones menores con 20 años de experiencia.".to_string(),
            rating: 4.7,
            review_count: 156,
            phone: "+56 9 1234 5678".to_string(),
            location: "Ñuñoa y comunas cercanas".to_string(),
            verified: true,
            specialties: strings(&["Plomería", "Electricidad", "Cerrajería"]),
            price: "Desde $15.000".to_string(),
        },
        Service {
            id: "4".to_string(),
            name: "Seguros Vida Dorada".to_string(),
            category: ServiceCategory::Insurance,
            description: "Seguros de vida y oncológicos especializados para la tercera edad.".to_string(),
            rating: 4.6,
            review_count: 203,
            phone: "+56 2 3456 7890".to_string(),
            location: "Oficinas en todo Chile".to_string(),
            verified: true,
            specialties: strings(&["Seguro de Vida", "Seguro Oncológico", "Cobertura Dental"]),
            price: "Cotización gratuita".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ids(services: &[&Service]) -> Vec<String> {
        services.iter().map(|s| s.id.clone()).collect()
    }

    #[test]
    fn empty_query_shows_everything() {
        let market = Marketplace::seeded();
        assert_eq!(market.visible().len(), 4);
    }

    #[test]
    fn salud_search_in_all_returns_only_telemedicine() {
        let catalogue = catalogue();
        let found = filter_services(&catalogue, CategoryFilter::All, "salud");
        assert_eq!(ids(&found), vec!["1".to_string()]);
        assert!(found[0].name.contains("Telemedicina"));
    }

    #[test]
    fn category_filter_narrows_results() {
        let catalogue = catalogue();
        let legal = filter_services(&catalogue, CategoryFilter::Only(ServiceCategory::Legal), "");
        assert_eq!(ids(&legal), vec!["2".to_string()]);
    }

    #[test]
    fn search_ignores_case() {
        let catalogue = catalogue();
        let found = filter_services(&catalogue, CategoryFilter::All, "TESTAMENTOS");
        assert_eq!(ids(&found), vec!["2".to_string()]);
    }

    #[test]
    fn category_bar_starts_with_all() {
        let options = categories();
        assert_eq!(options.len(), 5);
        assert_eq!(options[0].id, CategoryFilter::All);
    }

    fn any_filter() -> impl Strategy<Value = CategoryFilter> {
        prop_oneof![
            Just(CategoryFilter::All),
            Just(CategoryFilter::Only(ServiceCategory::Health)),
            Just(CategoryFilter::Only(ServiceCategory::Legal)),
            Just(CategoryFilter::Only(ServiceCategory::Home)),
            Just(CategoryFilter::Only(ServiceCategory::Insurance)),
        ]
    }

    proptest! {
        #[test]
        fn filter_order_does_not_matter(
            category in any_filter(),
            search in "[a-zA-Záéíóúñ ]{0,8}",
        ) {
            let catalogue = catalogue();

            let category_first: Vec<&Service> = catalogue
                .iter()
                .filter(|s| matches_category(s, category))
                .filter(|s| matches_search(s, &search))
                .collect();

            let search_first: Vec<&Service> = catalogue
                .iter()
                .filter(|s| matches_search(s, &search))
                .filter(|s| matches_category(s, category))
                .collect();

            prop_assert_eq!(ids(&category_first), ids(&search_first));
            let filtered = filter_services(&catalogue, category, &search);
            prop_assert_eq!(ids(&category_first), ids(&filtered));
        }
    }
}
