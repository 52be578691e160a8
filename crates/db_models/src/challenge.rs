use crate::schema::challenges;
use serde::Serialize;

#[derive(Clone, Debug, Queryable, Serialize, Identifiable)]
pub struct Challenge {
	pub id: i32,
	pub title: String,
	pub category: String,
	pub description: String,
	pub difficulty: String,
	pub image: String,
}
