// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Local membership rules shared by every level.
//!
//! [`HierarchicalPolicy`] answers questions about a single container using
//! only the membership edge stored for it and the role capability table.
//! Inheritance from containing levels is the job of the per-level policies,
//! which pass their own `can_manage` / `can_invite` decisions into the rules
//! here.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::instrument;

use crate::error::Result;
use crate::principal::Principal;
use crate::roles::{Capabilities, LevelRole, TopRankRemoval};
use crate::store::MembershipStore;
use crate::types::UserId;

/// Membership lookups and rank rules for one level of the hierarchy.
pub struct HierarchicalPolicy<R: LevelRole> {
	store: Arc<dyn MembershipStore>,
	_role: PhantomData<fn() -> R>,
}

impl<R: LevelRole> Clone for HierarchicalPolicy<R> {
	fn clone(&self) -> Self {
		Self {
			store: Arc::clone(&self.store),
			_role: PhantomData,
		}
	}
}

impl<R: LevelRole> HierarchicalPolicy<R> {
	pub fn new(store: Arc<dyn MembershipStore>) -> Self {
		Self {
			store,
			_role: PhantomData,
		}
	}

	/// The role `user_id` holds directly in `container`.
	pub async fn role_of_user(&self, container: &R::Container, user_id: &UserId) -> Result<Option<R>> {
		Ok(R::find(self.store.as_ref(), container, user_id).await?)
	}

	/// The role the principal holds directly in `container`. Always `None`
	/// for an anonymous principal.
	pub async fn role_of(&self, container: &R::Container, principal: &Principal) -> Result<Option<R>> {
		match principal.user_id() {
			Some(user_id) => self.role_of_user(container, user_id).await,
			None => Ok(None),
		}
	}

	pub async fn is_member(&self, container: &R::Container, principal: &Principal) -> Result<bool> {
		Ok(self.role_of(container, principal).await?.is_some())
	}

	/// Returns true if the principal's direct role carries every capability in
	/// `required`.
	pub async fn has_capabilities(
		&self,
		container: &R::Container,
		principal: &Principal,
		required: Capabilities,
	) -> Result<bool> {
		Ok(self
			.role_of(container, principal)
			.await?
			.is_some_and(|role| role.capabilities().contains(required)))
	}

	pub async fn is_top_rank(&self, container: &R::Container, principal: &Principal) -> Result<bool> {
		self.has_capabilities(container, principal, Capabilities::TOP_RANK)
			.await
	}

	async fn target_is_top_rank(&self, container: &R::Container, target: &UserId) -> Result<bool> {
		Ok(self
			.role_of_user(container, target)
			.await?
			.is_some_and(R::is_top_rank))
	}

	/// Removal rule: system admins and self-removal always pass, then the
	/// level's [`TopRankRemoval`] rule applies on top of `can_manage`.
	#[instrument(
		level = "debug",
		skip(self, principal, can_manage),
		fields(scope = %R::LEVEL, container = %container, target = %target)
	)]
	pub async fn can_remove<F, Fut>(
		&self,
		container: &R::Container,
		target: &UserId,
		principal: &Principal,
		can_manage: F,
	) -> Result<bool>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<bool>>,
	{
		if principal.is_system_admin() {
			return Ok(true);
		}
		if principal.is(target) {
			return Ok(true);
		}
		if !principal.is_authenticated() {
			return Ok(false);
		}

		let allowed = match R::TOP_RANK_REMOVAL {
			TopRankRemoval::PeerOnly => {
				if !can_manage().await? {
					false
				} else if self.target_is_top_rank(container, target).await? {
					self.is_top_rank(container, principal).await?
				} else {
					true
				}
			}
			TopRankRemoval::Never => {
				if self.is_top_rank(container, principal).await? {
					!self.target_is_top_rank(container, target).await?
				} else {
					can_manage().await?
				}
			}
		};

		tracing::debug!(allowed, "remove member decision");
		Ok(allowed)
	}

	/// Grant rule: inviting requires `can_invite`, and handing out the
	/// top-rank role additionally requires the actor to hold it.
	#[instrument(
		level = "debug",
		skip(self, principal, can_invite),
		fields(scope = %R::LEVEL, container = %container, role = %role)
	)]
	pub async fn can_grant<F, Fut>(
		&self,
		container: &R::Container,
		role: R,
		principal: &Principal,
		can_invite: F,
	) -> Result<bool>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<bool>>,
	{
		if principal.is_system_admin() {
			return Ok(true);
		}

		let allowed = if !can_invite().await? {
			false
		} else if role.is_top_rank() {
			self.is_top_rank(container, principal).await?
		} else {
			true
		};

		tracing::debug!(allowed, "grant role decision");
		Ok(allowed)
	}

	/// Invite rule for a concrete target. A newcomer, or a member re-invited
	/// with the role they already hold, goes through [`Self::can_grant`]. A
	/// re-invite that would change an existing member's role is a role change
	/// and goes through [`Self::can_change_role`].
	#[instrument(
		level = "debug",
		skip(self, principal, can_invite, can_manage),
		fields(scope = %R::LEVEL, container = %container, target = %target, role = %role)
	)]
	pub async fn can_assign<I, IFut, M, MFut>(
		&self,
		container: &R::Container,
		target: &UserId,
		role: R,
		principal: &Principal,
		can_invite: I,
		can_manage: M,
	) -> Result<bool>
	where
		I: FnOnce() -> IFut,
		IFut: Future<Output = Result<bool>>,
		M: FnOnce() -> MFut,
		MFut: Future<Output = Result<bool>>,
	{
		if principal.is_system_admin() {
			return Ok(true);
		}

		match self.role_of_user(container, target).await? {
			Some(current) if current != role => {
				self.can_change_role(container, target, role, principal, can_manage)
					.await
			}
			_ => self.can_grant(container, role, principal, can_invite).await,
		}
	}

	/// Role-change rule: requires `can_manage` and an existing membership for
	/// the target. Moving a member into or out of the top-rank role requires
	/// the actor to hold it.
	#[instrument(
		level = "debug",
		skip(self, principal, can_manage),
		fields(scope = %R::LEVEL, container = %container, target = %target, role = %new_role)
	)]
	pub async fn can_change_role<F, Fut>(
		&self,
		container: &R::Container,
		target: &UserId,
		new_role: R,
		principal: &Principal,
		can_manage: F,
	) -> Result<bool>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<bool>>,
	{
		if principal.is_system_admin() {
			return Ok(true);
		}

		let allowed = if !can_manage().await? {
			false
		} else {
			match self.role_of_user(container, target).await? {
				None => false,
				Some(current) if current.is_top_rank() || new_role.is_top_rank() => {
					self.is_top_rank(container, principal).await?
				}
				Some(_) => true,
			}
		};

		tracing::debug!(allowed, "change role decision");
		Ok(allowed)
	}
}
