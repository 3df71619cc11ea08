use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, message = "Role name is required"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    #[validate(length(min = 1, message = "Role name is required"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EditUserRequest {
    #[validate(length(min = 1, message = "User name is required"))]
    pub user_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// One membership checkbox from the role edit screen.
#[derive(Debug, Deserialize)]
pub struct MembershipSelection {
    pub user_id: Uuid,
    pub selected: bool,
}

/// Full membership list for a role. Users absent from the list keep
/// their current membership state.
#[derive(Debug, Deserialize)]
pub struct EditUsersInRoleRequest {
    pub members: Vec<MembershipSelection>,
}

/// One role checkbox from the user's role edit screen.
#[derive(Debug, Deserialize)]
pub struct RoleSelection {
    pub role_id: Uuid,
    pub selected: bool,
}

/// Replacement role set for one user: every current membership is
/// removed, then the selected roles are added.
#[derive(Debug, Deserialize)]
pub struct ManageUserRolesRequest {
    pub roles: Vec<RoleSelection>,
}

/// One claim checkbox from the user's claim edit screen.
#[derive(Debug, Deserialize)]
pub struct ClaimSelection {
    pub claim_type: String,
    pub selected: bool,
}

/// Replacement claim set for one user, applied remove-all-then-add.
#[derive(Debug, Deserialize)]
pub struct ManageUserClaimsRequest {
    pub claims: Vec<ClaimSelection>,
}

/// Membership row for the user's role edit screen: every known role
/// with the user's current state.
#[derive(Debug, Serialize)]
pub struct RoleSelectionView {
    pub role_id: Uuid,
    pub name: String,
    pub selected: bool,
}

/// Claim row for the user's claim edit screen: every catalog claim with
/// the user's current state.
#[derive(Debug, Serialize)]
pub struct ClaimSelectionView {
    pub claim_type: String,
    pub selected: bool,
}

/// Query parameter naming the user being acted on. Checked before the
/// route path when the self-edit rule resolves its target.
#[derive(Debug, Deserialize, Default)]
pub struct TargetUserQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}
