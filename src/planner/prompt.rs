use crate::planner::profile::{BookingRecord, UserProfile};

/// One itinerary line per booking, in input order.
fn itinerary_lines(bookings: &[BookingRecord]) -> String {
    let mut listing = String::new();
    for booking in bookings {
        listing.push_str(&format!(
            "{}, {} from {} to {}\n",
            booking.city, booking.country, booking.check_in, booking.check_out
        ));
    }
    listing
}

/// Assembles the planner prompt. Pure: the same profile and bookings always
/// produce the byte-identical string.
pub fn build_prompt(user: &UserProfile, bookings: &[BookingRecord]) -> String {
    let preamble = "You are a personalized travel itinerary planner who can plan the \
                    itinerary by using the user's personal data like home city, age, \
                    hobbies, interests and favorite food. Date format is YYYY-MM-DD.\n";

    let narrative = format!(
        "{} who is of age {}, lives in {}, {} and has hobbies or is interested in {}. \
         {}'s favorite food is {}.\n",
        user.full_name,
        user.age,
        user.home_city,
        user.home_country,
        user.interests,
        user.first_name,
        user.favorite_food
    );

    let listing = format!(
        "Below are the cities {} will travel to.\n{}",
        user.first_name,
        itinerary_lines(bookings)
    );

    let closing = "Can you plan an itinerary with the above information? Please consider \
                   the hobbies, interests and favorite food listed above while planning \
                   this itinerary.\n";

    let greeting = format!("Start your response with Hello {}", user.first_name);

    format!("{preamble}{narrative}{listing}{closing}{greeting}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn jane() -> UserProfile {
        UserProfile {
            full_name: "Jane Doe".to_string(),
            first_name: "Jane".to_string(),
            age: 30,
            home_city: "Austin".to_string(),
            home_country: "USA".to_string(),
            interests: "hiking".to_string(),
            favorite_food: "tacos".to_string(),
        }
    }

    fn booking(city: &str, country: &str, check_in: &str, check_out: &str) -> BookingRecord {
        BookingRecord {
            city: city.to_string(),
            country: country.to_string(),
            check_in: NaiveDate::parse_from_str(check_in, "%Y-%m-%d").unwrap(),
            check_out: NaiveDate::parse_from_str(check_out, "%Y-%m-%d").unwrap(),
        }
    }

    #[test]
    fn single_booking_scenario() {
        let prompt = build_prompt(
            &jane(),
            &[booking("Paris", "France", "2024-05-01", "2024-05-10")],
        );

        assert_eq!(
            prompt
                .matches("Paris, France from 2024-05-01 to 2024-05-10")
                .count(),
            1
        );
        assert!(prompt.ends_with("Hello Jane"));
        assert!(prompt.contains("Jane Doe who is of age 30"));
        assert!(prompt.contains("lives in Austin, USA"));
        assert!(prompt.contains("favorite food is tacos"));
    }

    #[test]
    fn lines_follow_input_order() {
        let bookings = vec![
            booking("Paris", "France", "2024-05-01", "2024-05-10"),
            booking("Rome", "Italy", "2024-06-01", "2024-06-08"),
            booking("Tokyo", "Japan", "2024-07-15", "2024-07-29"),
        ];
        let prompt = build_prompt(&jane(), &bookings);

        let positions: Vec<usize> = ["Paris", "Rome", "Tokyo"]
            .iter()
            .map(|city| prompt.find(city).unwrap())
            .collect();
        assert!(positions[0] < positions[1]);
        assert!(positions[1] < positions[2]);

        let line_count = prompt
            .lines()
            .filter(|line| line.contains(" from ") && line.contains(" to "))
            .count();
        assert_eq!(line_count, bookings.len());
    }

    #[test]
    fn prompt_is_deterministic() {
        let bookings = vec![booking("Paris", "France", "2024-05-01", "2024-05-10")];
        let first = build_prompt(&jane(), &bookings);
        let second = build_prompt(&jane(), &bookings);
        assert_eq!(first, second);
    }

    #[test]
    fn quotes_in_profile_text_pass_through_untouched() {
        let mut user = jane();
        user.interests = r#"hiking "off trail" and kayaking"#.to_string();
        let prompt = build_prompt(&user, &[]);
        assert!(prompt.contains(r#"hiking "off trail" and kayaking"#));
    }
}
