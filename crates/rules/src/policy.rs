//! Access-control predicates. Every mutating route consults one of these
//! before touching an aggregate.

use crate::{roles::Actor, team::TeamRoster};

/// Dashboards are open to every elevated role.
pub fn can_view_dashboard(actor: &Actor) -> bool {
	actor.can_view_dashboard()
}

pub fn can_modify_team(actor: &Actor, team: &TeamRoster) -> bool {
	team.is_leader(actor.id) || actor.is_admin()
}

pub fn can_delete_team(actor: &Actor, team: &TeamRoster) -> bool {
	can_modify_team(actor, team)
}

/// Only the leader decides join requests, admins included.
pub fn can_decide_requests(actor: &Actor, team: &TeamRoster) -> bool {
	team.is_leader(actor.id)
}

pub fn can_modify_project(actor: &Actor, team: &TeamRoster) -> bool {
	team.is_member(actor.id) || actor.is_admin()
}

pub fn can_modify_user(actor: &Actor) -> bool {
	actor.is_admin()
}

/// Superusers may act as anyone but another superuser. Staff may act as
/// plain participants only: acting as an admin would hand them admin
/// rights. Nobody acts as themselves.
pub fn can_impersonate(actor: &Actor, target: &Actor) -> bool {
	if actor.id == target.id {
		return false;
	}

	let by = actor.capabilities();
	let of = target.capabilities();

	if by.superuser {
		!of.superuser
	} else if by.staff {
		!of.superuser && !of.staff && !of.admin
	} else {
		false
	}
}

/// Keeps the users `actor` may impersonate, preserving order.
pub fn impersonatable<T, F>(actor: &Actor, users: Vec<T>, as_actor: F) -> Vec<T>
where
	F: Fn(&T) -> Actor,
{
	users
		.into_iter()
		.filter(|u| can_impersonate(actor, &as_actor(u)))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{roles::Role, team::Membership};
	use chrono::NaiveDate;

	fn team() -> TeamRoster {
		let joined_at = NaiveDate::from_ymd(2024, 10, 1).and_hms(9, 0, 0);
		TeamRoster {
			id: 1,
			leader_id: 1,
			looking_for_members: true,
			members: vec![
				Membership { user_id: 1, joined_at },
				Membership { user_id: 2, joined_at },
			],
			mentors: vec![3],
		}
	}

	#[test]
	fn dashboard_roles() {
		assert!(!can_view_dashboard(&Actor::participant(1)));
		for role in &[
			Role::Admin,
			Role::Moderator,
			Role::Gpe,
			Role::Mentor,
			Role::Registration,
		] {
			assert!(can_view_dashboard(&Actor::new(1, *role, false)));
		}
	}

	#[test]
	fn team_modification() {
		let t = team();
		assert!(can_modify_team(&Actor::participant(1), &t));
		assert!(!can_modify_team(&Actor::participant(2), &t));
		assert!(!can_modify_team(&Actor::new(3, Role::Mentor, false), &t));
		assert!(can_delete_team(&Actor::new(9, Role::Admin, false), &t));
		assert!(!can_decide_requests(&Actor::new(9, Role::Admin, false), &t));
	}

	#[test]
	fn project_modification() {
		let t = team();
		assert!(can_modify_project(&Actor::participant(2), &t));
		assert!(!can_modify_project(&Actor::new(3, Role::Mentor, false), &t));
		assert!(can_modify_project(&Actor::new(4, Role::Participant, true), &t));
	}

	#[test]
	fn user_modification_is_admin_only() {
		assert!(can_modify_user(&Actor::new(1, Role::Admin, false)));
		assert!(!can_modify_user(&Actor::new(1, Role::Moderator, false)));
	}

	#[test]
	fn impersonation_matrix() {
		let superuser = Actor::new(1, Role::Admin, true);
		let other_superuser = Actor::new(2, Role::Participant, true);
		let staff = Actor::new(3, Role::Mentor, false);
		let other_staff = Actor::new(4, Role::Gpe, false);
		let admin = Actor::new(5, Role::Admin, false);
		let user = Actor::participant(6);

		assert!(can_impersonate(&superuser, &staff));
		assert!(can_impersonate(&superuser, &user));
		assert!(can_impersonate(&superuser, &admin));
		assert!(!can_impersonate(&superuser, &other_superuser));
		assert!(!can_impersonate(&superuser, &superuser));

		assert!(can_impersonate(&staff, &user));
		assert!(!can_impersonate(&staff, &admin));
		assert!(!can_impersonate(&staff, &other_staff));
		assert!(!can_impersonate(&staff, &superuser));

		assert!(!can_impersonate(&admin, &user));
		assert!(!can_impersonate(&user, &admin));
	}

	#[test]
	fn staff_cannot_borrow_admin_rights() {
		let admin = Actor::new(9, Role::Admin, false);
		assert!(admin.capabilities().admin);

		for role in &[Role::Gpe, Role::Mentor, Role::Registration, Role::Moderator] {
			let staff = Actor::new(1, *role, false);
			assert!(
				!can_impersonate(&staff, &admin),
				"{} could act as an admin",
				role
			);
		}
		assert!(can_impersonate(&Actor::new(2, Role::Participant, true), &admin));
	}

	#[test]
	fn impersonatable_filters() {
		let staff = Actor::new(3, Role::Registration, false);
		let users = vec![
			Actor::participant(1),
			Actor::new(2, Role::Mentor, false),
			staff.clone(),
			Actor::new(4, Role::Moderator, false),
		];
		let ids: Vec<_> = impersonatable(&staff, users, |u| u.clone())
			.into_iter()
			.map(|u| u.id)
			.collect();
		assert_eq!(ids, vec![1, 4]);
	}
}
