use crate::models::{BloodGroup, DonorRecord, Urgency};
use crate::services::Prompt;

/// Marker sent in place of a missing city
pub const UNSPECIFIED_CITY: &str = "Not specified";

const SYSTEM_INSTRUCTION: &str = "You help a blood donation service decide which donors a hospital should contact first.

Weigh the following when ordering donors:
1. Location: donors in the requested city come first.
2. Donation history: donors who have not donated recently are more likely to be eligible.
3. Experience: donors with more total donations tend to be more reliable.
4. The urgency of the request.

Answer with a single JSON object containing:
- \"rankings\": every donor id, best match first
- \"insights\": a short explanation of the ordering
- \"recommendations\": optional advice for the hospital or administrators";

/// Build the ranking prompt for the fetched donor set
pub fn build_prompt(
    blood_group: BloodGroup,
    city: Option<&str>,
    urgency: Urgency,
    donors: &[DonorRecord],
) -> Result<Prompt, serde_json::Error> {
    let donors_json = serde_json::to_string_pretty(donors)?;

    let user = format!(
        "Rank these donors for a blood request.\n\n\
         Blood group needed: {}\n\
         City: {}\n\
         Urgency: {}\n\n\
         Available donors:\n{}\n\n\
         Return your rankings and analysis.",
        blood_group,
        city.unwrap_or(UNSPECIFIED_CITY),
        urgency.as_str(),
        donors_json,
    );

    Ok(Prompt {
        system: SYSTEM_INSTRUCTION.to_string(),
        user,
    })
}
