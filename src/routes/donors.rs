use actix_web::{web, HttpResponse};
use crate::models::{BloodGroup, DonorFilter, SearchDonorsQuery, SearchDonorsResponse};
use crate::routes::{bad_request, repository_error_response, AppState};

/// Configure donor search routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/donors", web::get().to(search_donors));
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Build a repository filter from the search query string
pub fn filter_from_query(query: SearchDonorsQuery) -> Result<DonorFilter, String> {
    let blood_group = non_blank(query.blood_group)
        .map(|group| group.parse::<BloodGroup>())
        .transpose()
        .map_err(|e| e.to_string())?;

    Ok(DonorFilter {
        blood_group,
        city: non_blank(query.city),
        pincode: non_blank(query.pincode),
    })
}

/// Manual donor search without AI ranking
///
/// GET /api/v1/donors?blood_group=O-&city=pune&pincode=411001
async fn search_donors(state: web::Data<AppState>, query: web::Query<SearchDonorsQuery>) -> HttpResponse {
    let filter = match filter_from_query(query.into_inner()) {
        Ok(filter) => filter,
        Err(message) => return bad_request("Invalid blood group", message),
    };

    tracing::debug!("Searching donors: {:?}", filter);

    match state.repository.fetch_available_donors(&filter).await {
        Ok(donors) => HttpResponse::Ok().json(SearchDonorsResponse {
            total: donors.len(),
            donors,
        }),
        Err(e) => repository_error_response("Failed to search donors", &e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_from_query_drops_blank_values() {
        let filter = filter_from_query(SearchDonorsQuery {
            blood_group: Some("B-".to_string()),
            city: Some("  ".to_string()),
            pincode: None,
        })
        .unwrap();

        assert_eq!(filter, DonorFilter::by_blood_group(BloodGroup::BNegative));
    }

    #[test]
    fn test_filter_from_query_rejects_unknown_group() {
        let result = filter_from_query(SearchDonorsQuery {
            blood_group: Some("C+".to_string()),
            ..SearchDonorsQuery::default()
        });

        assert!(result.is_err());
    }
}
