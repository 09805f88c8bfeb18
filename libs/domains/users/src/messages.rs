//! User-facing messages returned in response bodies.

pub const EMAIL_EXISTS: &str = "Email đã tồn tại";
pub const USER_NOT_FOUND: &str = "Không tìm thấy người dùng";

pub const USER_CREATED: &str = "Tạo người dùng thành công";
pub const USERS_CREATED: &str = "Tạo nhiều người dùng thành công";
pub const USER_UPDATED: &str = "Cập nhật người dùng thành công";
pub const USER_DELETED: &str = "Xóa người dùng thành công";

pub const NAME_REQUIRED: &str = "Tên không được để trống";
pub const NAME_TOO_SHORT: &str = "Tên phải có ít nhất 2 ký tự";
pub const AGE_REQUIRED: &str = "Tuổi không được để trống";
pub const AGE_NEGATIVE: &str = "Tuổi phải >= 0";
pub const EMAIL_REQUIRED: &str = "Email không được để trống";
pub const EMAIL_INVALID: &str = "Email không hợp lệ";
